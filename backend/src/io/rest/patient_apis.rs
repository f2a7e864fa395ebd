//! # REST API for Patients
//!
//! Signup, login, profile lookup and the patient's own views of
//! appointments and notifications.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use crate::io::rest::mappers::{AppointmentMapper, DirectoryMapper, NotificationMapper};
use crate::io::rest::{error_response, Actor, JsonBody};
use crate::AppState;
use shared::{LoginRequest, PatientLoginResponse, PatientSignupRequest, PatientSignupResponse};

/// Create a router for patient related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup_patient))
        .route("/login", post(login_patient))
        .route("/:id", get(get_patient))
        .route("/:id/appointments", get(list_patient_appointments))
        .route("/:id/notifications", get(list_unread_notifications))
}

/// Register a new patient
pub async fn signup_patient(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PatientSignupRequest>,
) -> impl IntoResponse {
    info!("POST /api/patients/signup - username: {}", request.username);

    let command = DirectoryMapper::to_signup_command(request);
    match state.patient_service.signup(command).await {
        Ok(patient) => {
            let response = PatientSignupResponse {
                message: "Patient signed up successfully".to_string(),
                patient: DirectoryMapper::to_patient_dto(patient),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to sign up patient: {}", e);
            error_response(e)
        }
    }
}

/// Check patient credentials
pub async fn login_patient(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/patients/login - username: {}", request.username);

    match state.patient_service.login(DirectoryMapper::to_login_command(request)).await {
        Ok(patient) => {
            let response = PatientLoginResponse {
                message: "Login successful".to_string(),
                patient_id: patient.id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Patient login failed: {}", e);
            error_response(e)
        }
    }
}

/// Get a patient by ID
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/patients/{}", patient_id);

    match state.patient_service.get_patient(patient_id).await {
        Ok(patient) => (StatusCode::OK, Json(DirectoryMapper::to_patient_dto(patient))).into_response(),
        Err(e) => {
            error!("Failed to get patient: {}", e);
            error_response(e)
        }
    }
}

/// List a patient's appointments, earliest first
pub async fn list_patient_appointments(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/patients/{}/appointments", patient_id);

    match state.appointment_service.list_patient_appointments(patient_id).await {
        Ok(appointments) => (StatusCode::OK, Json(AppointmentMapper::to_dto_list(appointments))).into_response(),
        Err(e) => {
            error!("Failed to list patient appointments: {}", e);
            error_response(e)
        }
    }
}

/// List a patient's unread notifications, oldest first
pub async fn list_unread_notifications(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(patient_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/patients/{}/notifications - actor: {}", patient_id, principal);

    match state.notification_service.list_unread(&principal, patient_id).await {
        Ok(notifications) => {
            (StatusCode::OK, Json(NotificationMapper::to_dto_list(notifications))).into_response()
        }
        Err(e) => {
            error!("Failed to list notifications: {}", e);
            error_response(e)
        }
    }
}
