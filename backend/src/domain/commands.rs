//! Domain-level command and result types.
//! The REST layer maps the public DTOs from the `shared` crate to these.

pub mod appointments {
    use chrono::{DateTime, Utc};

    use crate::domain::models::{AppointmentDetails, Notification};

    /// Input for booking an appointment. Time and reason are optional here
    /// so that their absence is reported as invalid input.
    #[derive(Debug, Clone)]
    pub struct CreateAppointmentCommand {
        pub doctor_id: i64,
        pub patient_id: i64,
        pub scheduled_at: Option<DateTime<Utc>>,
        pub reason: Option<String>,
    }

    /// Input for recording clinical details. Omitted fields are left as is.
    #[derive(Debug, Clone)]
    pub struct UpdateAppointmentDetailsCommand {
        pub appointment_id: i64,
        pub prescription: Option<String>,
        pub diagnosis: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct RescheduleAppointmentCommand {
        pub appointment_id: i64,
        pub scheduled_at: DateTime<Utc>,
    }

    /// Result of an approval: the approved appointment and the message sent
    #[derive(Debug, Clone)]
    pub struct ApproveAppointmentResult {
        pub appointment: AppointmentDetails,
        pub notification: Notification,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateAppointmentDetailsResult {
        pub appointment: AppointmentDetails,
        pub notification: Notification,
    }

    #[derive(Debug, Clone)]
    pub struct RescheduleAppointmentResult {
        pub appointment: AppointmentDetails,
        /// Sent only when the appointment was already approved
        pub notification: Option<Notification>,
    }
}

pub mod directory {
    /// Input for creating a doctor account and profile
    #[derive(Debug, Clone)]
    pub struct CreateDoctorCommand {
        pub username: String,
        pub email: String,
        pub password: String,
        pub specialty: String,
    }

    /// Input for patient self-signup
    #[derive(Debug, Clone)]
    pub struct SignupPatientCommand {
        pub username: String,
        pub email: String,
        pub password: String,
        /// YYYY-MM-DD
        pub birth_date: String,
        pub phone_number: String,
    }

    #[derive(Debug, Clone)]
    pub struct LoginCommand {
        pub username: String,
        pub password: String,
    }
}
