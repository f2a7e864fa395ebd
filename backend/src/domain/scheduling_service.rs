//! Scheduling engine: decides whether a doctor is free at a given time.
//!
//! The check is read-only and runs on the caller's connection, so the
//! appointment service can perform it inside the same transaction as the
//! write that follows. The store's overlap trigger enforces the same rule.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::appointment::{conflict_window, truncate_to_seconds};
use crate::storage::AppointmentRepository;

#[derive(Clone, Default)]
pub struct SchedulingService {
    appointment_repository: AppointmentRepository,
}

impl SchedulingService {
    pub fn new() -> Self {
        Self {
            appointment_repository: AppointmentRepository::new(),
        }
    }

    /// Fail with `SchedulingConflict` if the doctor has any appointment,
    /// pending or approved, within the closed ±30 minute window around
    /// `proposed`. `exclude_appointment_id` skips the appointment being moved.
    ///
    /// An absent time skips the check. Callers that persist a time must
    /// therefore require it before calling.
    pub async fn validate_no_conflict(
        &self,
        conn: &mut SqliteConnection,
        doctor_id: i64,
        proposed: Option<DateTime<Utc>>,
        exclude_appointment_id: Option<i64>,
    ) -> DomainResult<()> {
        let Some(proposed) = proposed else {
            debug!("No time proposed for doctor {}, skipping conflict check", doctor_id);
            return Ok(());
        };

        let (start, end) = conflict_window(truncate_to_seconds(proposed));
        let clashes = self
            .appointment_repository
            .find_in_window(conn, doctor_id, start, end, exclude_appointment_id)
            .await?;

        if let Some(existing) = clashes.first() {
            warn!(
                "Scheduling conflict for doctor {} at {}: appointment {} at {}",
                doctor_id, proposed, existing.id, existing.scheduled_at
            );
            return Err(DomainError::SchedulingConflict);
        }

        Ok(())
    }
}
