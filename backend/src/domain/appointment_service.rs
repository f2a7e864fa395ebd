//! Appointment lifecycle.
//!
//! Appointments start `Pending` and are approved exactly once. Every
//! transition that concerns the patient writes a notification in the same
//! transaction as the appointment change, so neither is ever visible
//! without the other.
//!
//! ## Key Responsibilities
//!
//! - **Booking**: resolve doctor and patient, run the conflict check and
//!   insert in one transaction
//! - **Approval**: conditional flip of the approval flag plus notification
//! - **Clinical details**: prescription and diagnosis, only once approved
//! - **Rescheduling**: re-check the window excluding the appointment itself
//! - **Removal**: administrative delete, no state restriction

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::SqliteConnection;
use tracing::{error, info, warn};

use crate::domain::commands::appointments::{
    ApproveAppointmentResult, CreateAppointmentCommand, RescheduleAppointmentCommand,
    RescheduleAppointmentResult, UpdateAppointmentDetailsCommand, UpdateAppointmentDetailsResult,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::appointment::{truncate_to_seconds, NewAppointment};
use crate::domain::models::{Appointment, AppointmentDetails, Principal};
use crate::domain::{NotificationService, SchedulingService};
use crate::storage::{AppointmentRepository, DbConnection, DoctorRepository, PatientRepository};

const WHEN_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

#[derive(Clone)]
pub struct AppointmentService {
    db: DbConnection,
    scheduling_service: SchedulingService,
    notification_service: NotificationService,
    appointment_repository: AppointmentRepository,
    doctor_repository: DoctorRepository,
    patient_repository: PatientRepository,
    /// Offset used to render appointment times in notification text
    display_offset: FixedOffset,
}

impl AppointmentService {
    pub fn new(
        db: DbConnection,
        scheduling_service: SchedulingService,
        notification_service: NotificationService,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            db,
            scheduling_service,
            notification_service,
            appointment_repository: AppointmentRepository::new(),
            doctor_repository: DoctorRepository::new(),
            patient_repository: PatientRepository::new(),
            display_offset,
        }
    }

    /// Book a pending appointment
    pub async fn create_appointment(
        &self,
        principal: &Principal,
        command: CreateAppointmentCommand,
    ) -> DomainResult<AppointmentDetails> {
        info!(
            "Creating appointment: doctor_id={}, patient_id={}, time={:?}",
            command.doctor_id, command.patient_id, command.scheduled_at
        );

        let scheduled_at = command
            .scheduled_at
            .map(truncate_to_seconds)
            .ok_or_else(|| DomainError::invalid("Appointment date is required"))?;
        let reason = command
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| DomainError::invalid("Appointment reason is required"))?
            .to_string();

        let mut tx = self.db.begin_write().await?;

        if self.doctor_repository.get(&mut tx, command.doctor_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Doctor {} not found", command.doctor_id)));
        }
        if self.patient_repository.get(&mut tx, command.patient_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Patient {} not found", command.patient_id)));
        }

        if !principal.acts_for_patient(command.patient_id) && !principal.acts_for_doctor(command.doctor_id) {
            warn!("{} may not book for patient {}", principal, command.patient_id);
            return Err(DomainError::forbidden("You may only book appointments for yourself"));
        }

        self.scheduling_service
            .validate_no_conflict(&mut tx, command.doctor_id, Some(scheduled_at), None)
            .await?;

        let new_appointment = NewAppointment {
            doctor_id: command.doctor_id,
            patient_id: command.patient_id,
            scheduled_at,
            reason,
            created_at: Utc::now(),
        };
        let appointment_id = self.appointment_repository.insert(&mut tx, &new_appointment).await?;
        let details = self.load_details(&mut tx, appointment_id).await?;

        tx.commit().await?;

        info!("Created appointment {} for doctor {}", appointment_id, command.doctor_id);
        Ok(details)
    }

    /// Approve a pending appointment and notify the patient, atomically
    pub async fn approve_appointment(
        &self,
        principal: &Principal,
        appointment_id: i64,
    ) -> DomainResult<ApproveAppointmentResult> {
        info!("Approving appointment {} as {}", appointment_id, principal);

        let mut tx = self.db.begin_write().await?;

        let appointment = self.load(&mut tx, appointment_id).await?;
        ensure_doctor(principal, &appointment)?;

        if appointment.status.is_approved() {
            warn!("Appointment {} is already approved", appointment_id);
            return Err(DomainError::AlreadyApproved(appointment_id));
        }

        let approved_at = truncate_to_seconds(Utc::now());
        if !self.appointment_repository.mark_approved(&mut tx, appointment_id, approved_at).await? {
            // Another request approved it between our read and write
            warn!("Appointment {} was approved concurrently", appointment_id);
            return Err(DomainError::AlreadyApproved(appointment_id));
        }

        let details = self.load_details(&mut tx, appointment_id).await?;
        let message = format!(
            "Your appointment with Dr. {} scheduled for {} has been approved.",
            details.doctor_name,
            self.format_when(details.appointment.scheduled_at)
        );

        // Any failure from here on drops the transaction and undoes the approval
        let notification = self
            .notification_service
            .notify(&mut tx, details.appointment.patient_id, &message)
            .await
            .map_err(|e| {
                error!("Failed to notify patient about approval of {}: {}", appointment_id, e);
                e
            })?;

        tx.commit().await?;

        info!("Approved appointment {}", appointment_id);
        Ok(ApproveAppointmentResult {
            appointment: details,
            notification,
        })
    }

    /// Record prescription and/or diagnosis on an approved appointment
    pub async fn update_appointment_details(
        &self,
        principal: &Principal,
        command: UpdateAppointmentDetailsCommand,
    ) -> DomainResult<UpdateAppointmentDetailsResult> {
        let appointment_id = command.appointment_id;
        info!("Updating details of appointment {} as {}", appointment_id, principal);

        let mut tx = self.db.begin_write().await?;

        let appointment = self.load(&mut tx, appointment_id).await?;
        ensure_doctor(principal, &appointment)?;

        if !appointment.status.is_approved() {
            warn!("Appointment {} is not approved; details rejected", appointment_id);
            return Err(DomainError::NotApproved(appointment_id));
        }

        if command.prescription.is_none() && command.diagnosis.is_none() {
            return Err(DomainError::invalid("Provide a prescription or a diagnosis"));
        }

        self.appointment_repository
            .update_details(
                &mut tx,
                appointment_id,
                command.prescription.as_deref(),
                command.diagnosis.as_deref(),
            )
            .await?;

        let details = self.load_details(&mut tx, appointment_id).await?;
        let message = format!(
            "Dr. {} has updated the details of your appointment scheduled for {}.",
            details.doctor_name,
            self.format_when(details.appointment.scheduled_at)
        );
        let notification = self
            .notification_service
            .notify(&mut tx, details.appointment.patient_id, &message)
            .await?;

        tx.commit().await?;

        info!("Updated details of appointment {}", appointment_id);
        Ok(UpdateAppointmentDetailsResult {
            appointment: details,
            notification,
        })
    }

    /// Move an appointment to a new time, keeping its approval state
    pub async fn reschedule_appointment(
        &self,
        principal: &Principal,
        command: RescheduleAppointmentCommand,
    ) -> DomainResult<RescheduleAppointmentResult> {
        let appointment_id = command.appointment_id;
        let scheduled_at = truncate_to_seconds(command.scheduled_at);
        info!("Rescheduling appointment {} to {} as {}", appointment_id, scheduled_at, principal);

        let mut tx = self.db.begin_write().await?;

        let appointment = self.load(&mut tx, appointment_id).await?;
        if !principal.acts_for_doctor(appointment.doctor_id) && !principal.acts_for_patient(appointment.patient_id) {
            warn!("{} may not reschedule appointment {}", principal, appointment_id);
            return Err(DomainError::forbidden("You may only reschedule your own appointments"));
        }

        self.scheduling_service
            .validate_no_conflict(&mut tx, appointment.doctor_id, Some(scheduled_at), Some(appointment_id))
            .await?;

        self.appointment_repository
            .update_schedule(&mut tx, appointment_id, appointment.doctor_id, scheduled_at)
            .await?;

        let details = self.load_details(&mut tx, appointment_id).await?;
        let notification = if details.appointment.status.is_approved() {
            let message = format!(
                "Your appointment with Dr. {} has been rescheduled to {}.",
                details.doctor_name,
                self.format_when(scheduled_at)
            );
            Some(
                self.notification_service
                    .notify(&mut tx, details.appointment.patient_id, &message)
                    .await?,
            )
        } else {
            None
        };

        tx.commit().await?;

        info!("Rescheduled appointment {}", appointment_id);
        Ok(RescheduleAppointmentResult {
            appointment: details,
            notification,
        })
    }

    /// Administrative removal, whatever the approval state
    pub async fn delete_appointment(&self, principal: &Principal, appointment_id: i64) -> DomainResult<()> {
        info!("Deleting appointment {} as {}", appointment_id, principal);

        let mut tx = self.db.begin_write().await?;

        self.load(&mut tx, appointment_id).await?;
        if !principal.is_staff() {
            warn!("{} may not delete appointment {}", principal, appointment_id);
            return Err(DomainError::forbidden("Only clinic staff may delete appointments"));
        }

        if !self.appointment_repository.delete(&mut tx, appointment_id).await? {
            return Err(not_found(appointment_id));
        }
        tx.commit().await?;

        info!("Deleted appointment {}", appointment_id);
        Ok(())
    }

    /// Get one appointment with names resolved
    pub async fn get_appointment(&self, appointment_id: i64) -> DomainResult<AppointmentDetails> {
        let mut conn = self.db.acquire().await?;
        self.load_details(&mut conn, appointment_id).await
    }

    /// All appointments of a doctor, earliest first
    pub async fn list_doctor_appointments(&self, doctor_id: i64) -> DomainResult<Vec<AppointmentDetails>> {
        info!("Listing appointments of doctor {}", doctor_id);

        let mut conn = self.db.acquire().await?;
        if self.doctor_repository.get(&mut conn, doctor_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Doctor {} not found", doctor_id)));
        }

        Ok(self.appointment_repository.list_for_doctor(&mut conn, doctor_id).await?)
    }

    /// All appointments of a patient, earliest first
    pub async fn list_patient_appointments(&self, patient_id: i64) -> DomainResult<Vec<AppointmentDetails>> {
        info!("Listing appointments of patient {}", patient_id);

        let mut conn = self.db.acquire().await?;
        if self.patient_repository.get(&mut conn, patient_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Patient {} not found", patient_id)));
        }

        Ok(self.appointment_repository.list_for_patient(&mut conn, patient_id).await?)
    }

    fn format_when(&self, time: DateTime<Utc>) -> String {
        time.with_timezone(&self.display_offset).format(WHEN_FORMAT).to_string()
    }

    async fn load(&self, conn: &mut SqliteConnection, appointment_id: i64) -> DomainResult<Appointment> {
        self.appointment_repository
            .get(conn, appointment_id)
            .await?
            .ok_or_else(|| not_found(appointment_id))
    }

    async fn load_details(&self, conn: &mut SqliteConnection, appointment_id: i64) -> DomainResult<AppointmentDetails> {
        self.appointment_repository
            .get_details(conn, appointment_id)
            .await?
            .ok_or_else(|| not_found(appointment_id))
    }
}

fn ensure_doctor(principal: &Principal, appointment: &Appointment) -> DomainResult<()> {
    if principal.acts_for_doctor(appointment.doctor_id) {
        return Ok(());
    }
    warn!("{} is not the doctor of appointment {}", principal, appointment.id);
    Err(DomainError::forbidden("Only the appointment's doctor may do this"))
}

fn not_found(appointment_id: i64) -> DomainError {
    DomainError::not_found(format!("Appointment {} not found", appointment_id))
}
