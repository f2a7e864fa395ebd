// Repository modules
pub mod appointment_repository;
pub mod doctor_repository;
pub mod notification_repository;
pub mod patient_repository;
pub mod user_repository;

pub use appointment_repository::{AppointmentRepository, SlotTaken};
pub use doctor_repository::DoctorRepository;
pub use notification_repository::NotificationRepository;
pub use patient_repository::PatientRepository;
pub use user_repository::UserRepository;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// Timestamps are stored as whole Unix seconds
pub(crate) fn from_unix(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| anyhow!("Stored timestamp out of range: {}", seconds))
}
