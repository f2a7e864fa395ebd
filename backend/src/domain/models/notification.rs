use chrono::{DateTime, Utc};

/// Patient-facing message. Only `is_read` changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub patient_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
