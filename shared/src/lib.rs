use serde::{Deserialize, Serialize};

/// A doctor as exposed over the API. `username` doubles as the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Calendar date (YYYY-MM-DD)
    pub birth_date: String,
    pub phone_number: String,
}

/// Appointment with doctor and patient display names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub doctor_name: String,
    pub patient_name: String,
    /// Scheduled time (RFC 3339, UTC)
    pub date: String,
    pub reason: String,
    pub is_approved: bool,
    /// Approval time (RFC 3339, UTC), present only once approved
    pub approved_at: Option<String>,
    pub prescription: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub patient_id: i64,
    pub message: String,
    pub is_read: bool,
    /// Creation time (RFC 3339, UTC)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birth_date: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSignupResponse {
    pub message: String,
    pub patient: Patient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientLoginResponse {
    pub message: String,
    pub patient_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorLoginResponse {
    pub message: String,
    pub doctor_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: i64,
    pub patient_id: i64,
    /// Requested time (RFC 3339). Required; optional here so a missing value
    /// is reported as a validation error rather than a deserialization failure.
    pub date: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveAppointmentResponse {
    pub message: String,
    pub appointment: Appointment,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateAppointmentDetailsRequest {
    pub prescription: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAppointmentDetailsResponse {
    pub message: String,
    pub prescription: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    /// New time (RFC 3339)
    pub date: String,
}

/// Plain acknowledgement body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error body returned for every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
