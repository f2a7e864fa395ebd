//! Errors surfaced by domain services. Every variant is a distinct,
//! caller-visible outcome; `Internal` hides storage details from clients.
use crate::domain::models::appointment::CONFLICT_WINDOW_MINUTES;
use crate::storage::SlotTaken;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error(
        "The doctor already has an appointment within {} minutes of the requested time",
        CONFLICT_WINDOW_MINUTES
    )]
    SchedulingConflict,
    #[error("Appointment {0} is already approved")]
    AlreadyApproved(i64),
    #[error("Appointment {0} must be approved before details can be recorded")]
    NotApproved(i64),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(err: anyhow::Error) -> Self {
        // The store's exclusion trigger fired: same outcome as the service check
        if err.downcast_ref::<SlotTaken>().is_some() {
            return DomainError::SchedulingConflict;
        }
        DomainError::Internal(err)
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(err.into())
    }
}
