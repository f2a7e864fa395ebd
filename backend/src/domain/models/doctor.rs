//! Domain model for a doctor profile.

/// Doctor profile joined with its user account. Only `specialty` changes
/// after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub specialty: String,
}
