use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::commands::appointments::{
    CreateAppointmentCommand, RescheduleAppointmentCommand, UpdateAppointmentDetailsCommand,
};
use crate::domain::models::AppointmentDetails;
use crate::domain::{DomainError, DomainResult};
use crate::io::rest::mappers::format_timestamp;
use shared::{
    Appointment as SharedAppointment, CreateAppointmentRequest, RescheduleAppointmentRequest,
    UpdateAppointmentDetailsRequest,
};

/// Mapper between appointment DTOs and domain commands/models.
pub struct AppointmentMapper;

impl AppointmentMapper {
    pub fn to_dto(domain: AppointmentDetails) -> SharedAppointment {
        let AppointmentDetails {
            appointment,
            doctor_name,
            patient_name,
        } = domain;

        SharedAppointment {
            id: appointment.id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            doctor_name,
            patient_name,
            date: format_timestamp(appointment.scheduled_at),
            reason: appointment.reason,
            is_approved: appointment.status.is_approved(),
            approved_at: appointment.status.approved_at().map(format_timestamp),
            prescription: appointment.prescription,
            diagnosis: appointment.diagnosis,
        }
    }

    pub fn to_dto_list(domain: Vec<AppointmentDetails>) -> Vec<SharedAppointment> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreateAppointmentRequest) -> DomainResult<CreateAppointmentCommand> {
        let scheduled_at = request.date.as_deref().map(parse_time).transpose()?;

        Ok(CreateAppointmentCommand {
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            scheduled_at,
            reason: request.reason,
        })
    }

    pub fn to_reschedule_command(
        appointment_id: i64,
        request: RescheduleAppointmentRequest,
    ) -> DomainResult<RescheduleAppointmentCommand> {
        Ok(RescheduleAppointmentCommand {
            appointment_id,
            scheduled_at: parse_time(&request.date)?,
        })
    }

    pub fn to_details_command(
        appointment_id: i64,
        request: UpdateAppointmentDetailsRequest,
    ) -> UpdateAppointmentDetailsCommand {
        UpdateAppointmentDetailsCommand {
            appointment_id,
            prescription: request.prescription,
            diagnosis: request.diagnosis,
        }
    }
}

/// Accepts RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM[:SS]` taken as UTC
fn parse_time(raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DomainError::invalid(format!("Invalid appointment date: {}", raw)))
}
