//! # REST API for Doctors
//!
//! Doctor directory, doctor login and a doctor's appointment list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use crate::io::rest::{error_response, JsonBody};
use crate::io::rest::mappers::{AppointmentMapper, DirectoryMapper};
use crate::AppState;
use shared::{CreateDoctorRequest, Doctor, DoctorLoginResponse, LoginRequest, UpdateDoctorRequest};

/// Create a router for doctor related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_doctors).post(create_doctor))
        .route("/login", post(login_doctor))
        .route("/:id", get(get_doctor).put(update_doctor))
        .route("/:id/appointments", get(list_doctor_appointments))
}

/// List all doctors
pub async fn list_doctors(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/doctors");

    match state.doctor_service.list_doctors().await {
        Ok(doctors) => {
            let doctors: Vec<Doctor> = doctors.into_iter().map(DirectoryMapper::to_doctor_dto).collect();
            (StatusCode::OK, Json(doctors)).into_response()
        }
        Err(e) => {
            error!("Failed to list doctors: {}", e);
            error_response(e)
        }
    }
}

/// Create a doctor account and profile
pub async fn create_doctor(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateDoctorRequest>,
) -> impl IntoResponse {
    info!("POST /api/doctors - username: {}, specialty: {}", request.username, request.specialty);

    let command = DirectoryMapper::to_create_doctor_command(request);
    match state.doctor_service.create_doctor(command).await {
        Ok(doctor) => (StatusCode::CREATED, Json(DirectoryMapper::to_doctor_dto(doctor))).into_response(),
        Err(e) => {
            error!("Failed to create doctor: {}", e);
            error_response(e)
        }
    }
}

/// Check doctor credentials
pub async fn login_doctor(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/doctors/login - username: {}", request.username);

    match state.doctor_service.login(DirectoryMapper::to_login_command(request)).await {
        Ok(doctor) => {
            let response = DoctorLoginResponse {
                message: "Login successful".to_string(),
                doctor_id: doctor.id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Doctor login failed: {}", e);
            error_response(e)
        }
    }
}

/// Get a doctor by ID
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/doctors/{}", doctor_id);

    match state.doctor_service.get_doctor(doctor_id).await {
        Ok(doctor) => (StatusCode::OK, Json(DirectoryMapper::to_doctor_dto(doctor))).into_response(),
        Err(e) => {
            error!("Failed to get doctor: {}", e);
            error_response(e)
        }
    }
}

/// Update a doctor's specialty
pub async fn update_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
    JsonBody(request): JsonBody<UpdateDoctorRequest>,
) -> impl IntoResponse {
    info!("PUT /api/doctors/{} - request: {:?}", doctor_id, request);

    match state.doctor_service.update_specialty(doctor_id, &request.specialty).await {
        Ok(doctor) => (StatusCode::OK, Json(DirectoryMapper::to_doctor_dto(doctor))).into_response(),
        Err(e) => {
            error!("Failed to update doctor: {}", e);
            error_response(e)
        }
    }
}

/// List a doctor's appointments, earliest first
pub async fn list_doctor_appointments(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/doctors/{}/appointments", doctor_id);

    match state.appointment_service.list_doctor_appointments(doctor_id).await {
        Ok(appointments) => (StatusCode::OK, Json(AppointmentMapper::to_dto_list(appointments))).into_response(),
        Err(e) => {
            error!("Failed to list doctor appointments: {}", e);
            error_response(e)
        }
    }
}
