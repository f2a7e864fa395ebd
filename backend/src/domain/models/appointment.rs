//! Domain model for an appointment and its approval state.
use chrono::{DateTime, Duration, Utc};

/// Minimum separation between two appointments of the same doctor
pub const CONFLICT_WINDOW_MINUTES: i64 = 30;
pub const CONFLICT_WINDOW_SECONDS: i64 = CONFLICT_WINDOW_MINUTES * 60;

/// Approval state. `Approved` carries its own timestamp so an approval time
/// can never exist on a pending appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Approved { approved_at: DateTime<Utc> },
}

impl AppointmentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, AppointmentStatus::Approved { .. })
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            AppointmentStatus::Pending => None,
            AppointmentStatus::Approved { approved_at } => Some(*approved_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub prescription: Option<String>,
    pub diagnosis: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Appointment with the doctor's and patient's display names
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentDetails {
    pub appointment: Appointment,
    pub doctor_name: String,
    pub patient_name: String,
}

/// Values for a row that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Closed interval of times that collide with `proposed`.
pub fn conflict_window(proposed: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let half = Duration::seconds(CONFLICT_WINDOW_SECONDS);
    (proposed - half, proposed + half)
}

/// Drop sub-second precision; the store keeps whole seconds.
pub fn truncate_to_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0).unwrap_or(time)
}
