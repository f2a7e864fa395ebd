use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::commands::directory::{CreateDoctorCommand, LoginCommand};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Doctor;
use crate::domain::validation::{validate_email, validate_password, validate_specialty, validate_username};
use crate::storage::{DbConnection, DoctorRepository, IdentityStore};

/// Service for doctor profiles and doctor login
#[derive(Clone)]
pub struct DoctorService {
    db: DbConnection,
    identity_store: Arc<dyn IdentityStore>,
    doctor_repository: DoctorRepository,
}

impl DoctorService {
    pub fn new(db: DbConnection, identity_store: Arc<dyn IdentityStore>) -> Self {
        Self {
            db,
            identity_store,
            doctor_repository: DoctorRepository::new(),
        }
    }

    /// Create a user account and its doctor profile
    pub async fn create_doctor(&self, command: CreateDoctorCommand) -> DomainResult<Doctor> {
        info!("Creating doctor: username={}, specialty={}", command.username, command.specialty);

        let username = validate_username(&command.username)?;
        let email = validate_email(&command.email)?;
        validate_password(&command.password)?;
        let specialty = validate_specialty(&command.specialty)?;

        let user = self
            .identity_store
            .create_user(&username, &email, &command.password)
            .await?
            .ok_or_else(|| DomainError::invalid("A user with that username already exists"))?;

        // The connection is released before the identity store is used again
        let inserted = match self.db.acquire().await {
            Ok(mut conn) => self.doctor_repository.insert(&mut conn, user.id, &specialty).await,
            Err(e) => Err(e),
        };
        let doctor_id = match inserted {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to create doctor profile for user {}: {}", user.id, e);
                // Do not leave an account without a profile behind
                if let Err(cleanup) = self.identity_store.delete_user(user.id).await {
                    error!("Failed to remove orphaned user {}: {}", user.id, cleanup);
                }
                return Err(e.into());
            }
        };

        let mut conn = self.db.acquire().await?;
        let doctor = self
            .doctor_repository
            .get(&mut conn, doctor_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Doctor {} not found", doctor_id)))?;

        info!("Created doctor: {} with ID: {}", doctor.username, doctor.id);
        Ok(doctor)
    }

    /// List all doctors ordered by username
    pub async fn list_doctors(&self) -> DomainResult<Vec<Doctor>> {
        info!("Listing all doctors");

        let mut conn = self.db.acquire().await?;
        let doctors = self.doctor_repository.list(&mut conn).await?;

        info!("Found {} doctors", doctors.len());
        Ok(doctors)
    }

    /// Get a doctor by ID
    pub async fn get_doctor(&self, doctor_id: i64) -> DomainResult<Doctor> {
        info!("Getting doctor: {}", doctor_id);

        let mut conn = self.db.acquire().await?;
        match self.doctor_repository.get(&mut conn, doctor_id).await? {
            Some(doctor) => Ok(doctor),
            None => {
                warn!("Doctor not found: {}", doctor_id);
                Err(DomainError::not_found(format!("Doctor {} not found", doctor_id)))
            }
        }
    }

    /// Change a doctor's specialty, the only mutable profile field
    pub async fn update_specialty(&self, doctor_id: i64, specialty: &str) -> DomainResult<Doctor> {
        info!("Updating specialty of doctor {}", doctor_id);

        let specialty = validate_specialty(specialty)?;

        let mut conn = self.db.acquire().await?;
        if !self.doctor_repository.update_specialty(&mut conn, doctor_id, &specialty).await? {
            warn!("Doctor not found: {}", doctor_id);
            return Err(DomainError::not_found(format!("Doctor {} not found", doctor_id)));
        }

        self.doctor_repository
            .get(&mut conn, doctor_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Doctor {} not found", doctor_id)))
    }

    /// Check credentials and resolve the doctor profile of the account
    pub async fn login(&self, command: LoginCommand) -> DomainResult<Doctor> {
        info!("Doctor login attempt: {}", command.username);

        let user = match self
            .identity_store
            .authenticate(command.username.trim(), &command.password)
            .await?
        {
            Some(user) => user,
            None => {
                warn!("Invalid credentials for {}", command.username);
                return Err(DomainError::Unauthorized);
            }
        };

        let mut conn = self.db.acquire().await?;
        let doctor = self
            .doctor_repository
            .get_by_user(&mut conn, user.id)
            .await?
            .ok_or_else(|| DomainError::not_found("No associated doctor found"))?;

        info!("Doctor {} logged in", doctor.id);
        Ok(doctor)
    }
}
