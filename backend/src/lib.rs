//! # Clinic Backend
//!
//! Appointment scheduling and approval for a medical clinic.
//!
//! This crate brings together:
//! - **Domain**: scheduling conflicts, the appointment lifecycle, patient
//!   notifications, and the doctor/patient directory
//! - **Storage**: SQLite persistence with store-level guards
//! - **IO**: the REST API consumed by the clinic frontend
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     ↓
//! IO Layer (axum handlers, DTO mappers)
//!     ↓
//! Domain Layer (services, principal checks)
//!     ↓
//! Storage Layer (sqlx repositories, schema)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{AppointmentService, DoctorService, NotificationService, PatientService, SchedulingService};
use crate::storage::{DbConnection, IdentityStore, UserRepository};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub doctor_service: DoctorService,
    pub patient_service: PatientService,
    pub appointment_service: AppointmentService,
    pub notification_service: NotificationService,
}

/// Open the database and wire up all services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db = if config.is_in_memory() {
        DbConnection::init_in_memory().await?
    } else {
        DbConnection::new(&config.database_url).await?
    };

    info!("Setting up domain model");
    let identity_store: Arc<dyn IdentityStore> = Arc::new(UserRepository::new(db.clone()));
    let notification_service = NotificationService::new(db.clone());
    let appointment_service = AppointmentService::new(
        db.clone(),
        SchedulingService::new(),
        notification_service.clone(),
        config.display_offset()?,
    );
    let doctor_service = DoctorService::new(db.clone(), identity_store.clone());
    let patient_service = PatientService::new(db, identity_store);

    info!("Setting up application state");
    Ok(AppState {
        doctor_service,
        patient_service,
        appointment_service,
        notification_service,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Result<Router> {
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", config.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
