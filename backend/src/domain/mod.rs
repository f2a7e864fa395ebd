//! # Domain Module
//!
//! Business rules of the clinic backend, independent of HTTP and of SQLite
//! details beyond the connection handed to repositories.
//!
//! ## Module Organization
//!
//! - **scheduling_service**: conflict detection for a doctor's time slots
//! - **appointment_service**: the appointment lifecycle (create, approve,
//!   clinical details, reschedule, delete) and its notification side effects
//! - **notification_service**: patient-facing messages
//! - **doctor_service** / **patient_service**: profiles, signup and login
//!   through the identity store
//! - **commands**: input and result types used by the services
//! - **models**: domain entities
//!
//! ## Business Rules
//!
//! - No two appointments of the same doctor lie within 30 minutes of each
//!   other (inclusive), whatever their approval state
//! - An appointment is approved at most once; approval and its notification
//!   commit together
//! - Prescription and diagnosis can only be recorded on approved appointments
//! - Every guarded operation receives the acting `Principal` explicitly

pub mod appointment_service;
pub mod commands;
pub mod doctor_service;
pub mod errors;
pub mod models;
pub mod notification_service;
pub mod patient_service;
pub mod scheduling_service;
pub mod validation;

pub use appointment_service::AppointmentService;
pub use doctor_service::DoctorService;
pub use errors::{DomainError, DomainResult};
pub use notification_service::NotificationService;
pub use patient_service::PatientService;
pub use scheduling_service::SchedulingService;
