use chrono::{DateTime, Utc};

/// Credential-bearing account owned by the identity store
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
