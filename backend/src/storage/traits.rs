//! # Storage Traits
//!
//! The identity store is an external collaborator from the domain's point of
//! view: the directory services only need to create accounts and check
//! credentials, so they depend on this trait rather than on SQLite.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::UserAccount;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an account. Returns `Ok(None)` when the username is taken.
    async fn create_user(&self, username: &str, email: &str, password: &str) -> Result<Option<UserAccount>>;

    /// Check credentials, returning the account on success
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserAccount>>;

    /// Remove an account. Returns true if it existed.
    async fn delete_user(&self, user_id: i64) -> Result<bool>;
}
