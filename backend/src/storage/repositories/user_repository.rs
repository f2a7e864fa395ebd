use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::from_unix;
use crate::domain::models::UserAccount;
use crate::storage::connection::DbConnection;
use crate::storage::traits::IdentityStore;

/// SQLite-backed identity store
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for UserRepository {
    async fn create_user(&self, username: &str, email: &str, password: &str) -> Result<Option<UserAccount>> {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let hash = hash_password(&salt, password);
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_salt, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(&salt)
        .bind(&hash)
        .bind(created_at.timestamp())
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(UserAccount {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: from_unix(created_at.timestamp())?,
        }))
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserAccount>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, created_at, password_salt, password_hash
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let salt: String = row.try_get("password_salt")?;
        let stored_hash: String = row.try_get("password_hash")?;
        if hash_password(&salt, password) != stored_hash {
            return Ok(None);
        }

        Ok(Some(row_to_user(&row)?))
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn row_to_user(row: &SqliteRow) -> Result<UserAccount> {
    Ok(UserAccount {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        created_at: from_unix(row.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test() -> UserRepository {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        UserRepository::new(db)
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let repo = setup_test().await;

        let user = repo
            .create_user("alice", "alice@example.com", "s3cret")
            .await
            .expect("Failed to create user")
            .expect("Username should be free");
        assert_eq!(user.username, "alice");

        let authenticated = repo.authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(authenticated.map(|u| u.id), Some(user.id));

        assert!(repo.authenticate("alice", "wrong").await.unwrap().is_none());
        assert!(repo.authenticate("bob", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = setup_test().await;

        repo.create_user("alice", "a@example.com", "one").await.unwrap();
        let duplicate = repo.create_user("alice", "other@example.com", "two").await.unwrap();
        assert!(duplicate.is_none());

        // The original password still works
        assert!(repo.authenticate("alice", "one").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_passwords_are_salted() {
        let repo = setup_test().await;

        repo.create_user("a", "a@example.com", "same").await.unwrap();
        repo.create_user("b", "b@example.com", "same").await.unwrap();

        let hashes: Vec<String> = sqlx::query_scalar("SELECT password_hash FROM users ORDER BY id")
            .fetch_all(repo.db.pool())
            .await
            .unwrap();
        assert_eq!(hashes.len(), 2);
        assert_ne!(hashes[0], hashes[1]);
        assert!(!hashes[0].contains("same"));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = setup_test().await;

        let user = repo.create_user("alice", "a@example.com", "pw").await.unwrap().unwrap();
        assert!(repo.delete_user(user.id).await.unwrap());
        assert!(!repo.delete_user(user.id).await.unwrap());
        assert!(repo.authenticate("alice", "pw").await.unwrap().is_none());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
