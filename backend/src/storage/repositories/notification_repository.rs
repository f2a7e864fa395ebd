use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::from_unix;
use crate::domain::models::Notification;

/// Repository for patient notifications
#[derive(Clone, Default)]
pub struct NotificationRepository;

impl NotificationRepository {
    pub fn new() -> Self {
        Self
    }

    /// Store an unread notification and return it
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        patient_id: i64,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Notification> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (patient_id, message, is_read, created_at)
            VALUES (?, ?, FALSE, ?)
            "#,
        )
        .bind(patient_id)
        .bind(message)
        .bind(created_at.timestamp())
        .execute(&mut *conn)
        .await?;

        Ok(Notification {
            id: result.last_insert_rowid(),
            patient_id,
            message: message.to_string(),
            is_read: false,
            created_at: from_unix(created_at.timestamp())?,
        })
    }

    /// Get a notification by ID
    pub async fn get(&self, conn: &mut SqliteConnection, notification_id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(
            r#"
            SELECT id, patient_id, message, is_read, created_at
            FROM notifications
            WHERE id = ?
            "#,
        )
        .bind(notification_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.as_ref().map(row_to_notification).transpose()
    }

    /// Unread notifications of a patient, oldest first
    pub async fn list_unread(&self, conn: &mut SqliteConnection, patient_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, patient_id, message, is_read, created_at
            FROM notifications
            WHERE patient_id = ? AND is_read = FALSE
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(row_to_notification).collect()
    }

    /// Count all notifications of a patient, read or not
    pub async fn count_for_patient(&self, conn: &mut SqliteConnection, patient_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE patient_id = ?")
            .bind(patient_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Set the read flag
    pub async fn mark_read(&self, conn: &mut SqliteConnection, notification_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
            .bind(notification_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a notification. Returns true if a row was removed.
    pub async fn delete(&self, conn: &mut SqliteConnection, notification_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(notification_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_notification(row: &SqliteRow) -> Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        message: row.try_get("message")?,
        is_read: row.try_get("is_read")?,
        created_at: from_unix(row.try_get("created_at")?)?,
    })
}
