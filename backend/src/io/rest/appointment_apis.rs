//! # REST API for Appointments
//!
//! Booking, approval, clinical details, rescheduling and removal. Every
//! mutating endpoint requires the acting party headers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use tracing::{error, info};

use crate::io::rest::mappers::{AppointmentMapper, NotificationMapper};
use crate::io::rest::{error_response, Actor, JsonBody};
use crate::AppState;
use shared::{
    ApproveAppointmentResponse, CreateAppointmentRequest, MessageResponse, RescheduleAppointmentRequest,
    UpdateAppointmentDetailsRequest, UpdateAppointmentDetailsResponse,
};

/// Create a router for appointment related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_appointment))
        .route("/:id", get(get_appointment).delete(delete_appointment))
        .route("/:id/approve", post(approve_appointment))
        .route("/:id/details", put(update_appointment_details))
        .route("/:id/schedule", put(reschedule_appointment))
}

/// Book a new appointment
pub async fn create_appointment(
    State(state): State<AppState>,
    Actor(principal): Actor,
    JsonBody(request): JsonBody<CreateAppointmentRequest>,
) -> impl IntoResponse {
    info!("POST /api/appointments - actor: {}, request: {:?}", principal, request);

    let command = match AppointmentMapper::to_create_command(request) {
        Ok(command) => command,
        Err(e) => return error_response(e),
    };

    match state.appointment_service.create_appointment(&principal, command).await {
        Ok(details) => (StatusCode::CREATED, Json(AppointmentMapper::to_dto(details))).into_response(),
        Err(e) => {
            error!("Failed to create appointment: {}", e);
            error_response(e)
        }
    }
}

/// Get an appointment by ID
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/appointments/{}", appointment_id);

    match state.appointment_service.get_appointment(appointment_id).await {
        Ok(details) => (StatusCode::OK, Json(AppointmentMapper::to_dto(details))).into_response(),
        Err(e) => {
            error!("Failed to get appointment: {}", e);
            error_response(e)
        }
    }
}

/// Approve a pending appointment
pub async fn approve_appointment(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    info!("POST /api/appointments/{}/approve - actor: {}", appointment_id, principal);

    match state.appointment_service.approve_appointment(&principal, appointment_id).await {
        Ok(result) => {
            let response = ApproveAppointmentResponse {
                message: "Appointment approved successfully".to_string(),
                appointment: AppointmentMapper::to_dto(result.appointment),
                notification: NotificationMapper::to_dto(result.notification),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to approve appointment: {}", e);
            error_response(e)
        }
    }
}

/// Record prescription and/or diagnosis
pub async fn update_appointment_details(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(appointment_id): Path<i64>,
    JsonBody(request): JsonBody<UpdateAppointmentDetailsRequest>,
) -> impl IntoResponse {
    info!("PUT /api/appointments/{}/details - actor: {}", appointment_id, principal);

    let command = AppointmentMapper::to_details_command(appointment_id, request);
    match state.appointment_service.update_appointment_details(&principal, command).await {
        Ok(result) => {
            let appointment = result.appointment.appointment;
            let response = UpdateAppointmentDetailsResponse {
                message: "Appointment details updated successfully".to_string(),
                prescription: appointment.prescription,
                diagnosis: appointment.diagnosis,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to update appointment details: {}", e);
            error_response(e)
        }
    }
}

/// Move an appointment to a new time
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(appointment_id): Path<i64>,
    JsonBody(request): JsonBody<RescheduleAppointmentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/appointments/{}/schedule - actor: {}, date: {}", appointment_id, principal, request.date);

    let command = match AppointmentMapper::to_reschedule_command(appointment_id, request) {
        Ok(command) => command,
        Err(e) => return error_response(e),
    };

    match state.appointment_service.reschedule_appointment(&principal, command).await {
        Ok(result) => (StatusCode::OK, Json(AppointmentMapper::to_dto(result.appointment))).into_response(),
        Err(e) => {
            error!("Failed to reschedule appointment: {}", e);
            error_response(e)
        }
    }
}

/// Remove an appointment
pub async fn delete_appointment(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/appointments/{} - actor: {}", appointment_id, principal);

    match state.appointment_service.delete_appointment(&principal, appointment_id).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Appointment deleted successfully"))).into_response(),
        Err(e) => {
            error!("Failed to delete appointment: {}", e);
            error_response(e)
        }
    }
}
