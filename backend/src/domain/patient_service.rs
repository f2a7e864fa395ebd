use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::commands::directory::{LoginCommand, SignupPatientCommand};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Patient;
use crate::domain::validation::{
    parse_birth_date, validate_email, validate_password, validate_phone_number, validate_username,
};
use crate::storage::{DbConnection, IdentityStore, PatientRepository};

/// Service for patient signup, login and profile lookup
#[derive(Clone)]
pub struct PatientService {
    db: DbConnection,
    identity_store: Arc<dyn IdentityStore>,
    patient_repository: PatientRepository,
}

impl PatientService {
    pub fn new(db: DbConnection, identity_store: Arc<dyn IdentityStore>) -> Self {
        Self {
            db,
            identity_store,
            patient_repository: PatientRepository::new(),
        }
    }

    /// Register a user account together with its patient profile
    pub async fn signup(&self, command: SignupPatientCommand) -> DomainResult<Patient> {
        info!("Signing up patient: username={}", command.username);

        let username = validate_username(&command.username)?;
        let email = validate_email(&command.email)?;
        validate_password(&command.password)?;
        let birth_date = parse_birth_date(&command.birth_date)?;
        let phone_number = validate_phone_number(&command.phone_number)?;

        let user = self
            .identity_store
            .create_user(&username, &email, &command.password)
            .await?
            .ok_or_else(|| DomainError::invalid("A user with that username already exists"))?;

        let inserted = match self.db.acquire().await {
            Ok(mut conn) => {
                self.patient_repository
                    .insert(&mut conn, user.id, birth_date, &phone_number)
                    .await
            }
            Err(e) => Err(e),
        };
        let patient_id = match inserted {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to create patient profile for user {}: {}", user.id, e);
                if let Err(cleanup) = self.identity_store.delete_user(user.id).await {
                    error!("Failed to remove orphaned user {}: {}", user.id, cleanup);
                }
                return Err(e.into());
            }
        };

        let mut conn = self.db.acquire().await?;
        let patient = self
            .patient_repository
            .get(&mut conn, patient_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Patient {} not found", patient_id)))?;

        info!("Signed up patient: {} with ID: {}", patient.username, patient.id);
        Ok(patient)
    }

    /// Check credentials and resolve the patient profile of the account
    pub async fn login(&self, command: LoginCommand) -> DomainResult<Patient> {
        info!("Patient login attempt: {}", command.username);

        let Some(user) = self
            .identity_store
            .authenticate(command.username.trim(), &command.password)
            .await?
        else {
            warn!("Invalid credentials for {}", command.username);
            return Err(DomainError::Unauthorized);
        };

        let mut conn = self.db.acquire().await?;
        let patient = self
            .patient_repository
            .get_by_user(&mut conn, user.id)
            .await?
            .ok_or_else(|| DomainError::not_found("No associated patient found"))?;

        info!("Patient {} logged in", patient.id);
        Ok(patient)
    }

    /// Get a patient by ID
    pub async fn get_patient(&self, patient_id: i64) -> DomainResult<Patient> {
        info!("Getting patient: {}", patient_id);

        let mut conn = self.db.acquire().await?;
        self.patient_repository
            .get(&mut conn, patient_id)
            .await?
            .ok_or_else(|| {
                warn!("Patient not found: {}", patient_id);
                DomainError::not_found(format!("Patient {} not found", patient_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::storage::UserRepository;
    use crate::test_utils::seed_doctor;

    async fn setup_test() -> (PatientService, DbConnection) {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let identity_store = Arc::new(UserRepository::new(db.clone()));
        (PatientService::new(db.clone(), identity_store), db)
    }

    fn signup_command(username: &str) -> SignupPatientCommand {
        SignupPatientCommand {
            username: username.to_string(),
            email: format!("{}@mail.test", username),
            password: "hunter2".to_string(),
            birth_date: "1985-11-02".to_string(),
            phone_number: "+44 20 7946 0958".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_and_get() {
        let (service, _db) = setup_test().await;

        let patient = service.signup(signup_command("alice")).await.expect("Signup failed");
        assert_eq!(patient.username, "alice");
        assert_eq!(patient.birth_date, NaiveDate::from_ymd_opt(1985, 11, 2).unwrap());
        assert_eq!(patient.phone_number, "+44 20 7946 0958");

        let fetched = service.get_patient(patient.id).await.unwrap();
        assert_eq!(fetched, patient);
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let (service, _db) = setup_test().await;

        let mut command = signup_command("alice");
        command.birth_date = "02/11/1985".to_string();
        assert!(matches!(service.signup(command).await, Err(DomainError::InvalidInput(_))));

        let mut command = signup_command("alice");
        command.birth_date = "2999-01-01".to_string();
        assert!(matches!(service.signup(command).await, Err(DomainError::InvalidInput(_))));

        let mut command = signup_command("alice");
        command.phone_number = "call me maybe".to_string();
        assert!(matches!(service.signup(command).await, Err(DomainError::InvalidInput(_))));

        let mut command = signup_command("alice");
        command.password = String::new();
        assert!(matches!(service.signup(command).await, Err(DomainError::InvalidInput(_))));

        // The username is still free after the rejected attempts
        service.signup(signup_command("alice")).await.expect("Signup failed");
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let (service, _db) = setup_test().await;

        service.signup(signup_command("alice")).await.unwrap();
        let result = service.signup(signup_command("alice")).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_login() {
        let (service, db) = setup_test().await;
        let patient = service.signup(signup_command("alice")).await.unwrap();

        let logged_in = service
            .login(LoginCommand {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .expect("Login failed");
        assert_eq!(logged_in.id, patient.id);

        let result = service
            .login(LoginCommand {
                username: "nobody".to_string(),
                password: "hunter2".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Unauthorized)));

        seed_doctor(&db, "house").await;
        let result = service
            .login(LoginCommand {
                username: "house".to_string(),
                password: "password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(message)) if message == "No associated patient found"));
    }

    #[tokio::test]
    async fn test_get_missing_patient() {
        let (service, _db) = setup_test().await;

        assert!(matches!(service.get_patient(999).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_profile_insert_removes_account() {
        let (service, db) = setup_test().await;
        sqlx::query("CREATE TRIGGER fail_patients BEFORE INSERT ON patients BEGIN SELECT RAISE(ABORT, 'disk full'); END;")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(service.signup(signup_command("alice")).await, Err(DomainError::Internal(_))));

        sqlx::query("DROP TRIGGER fail_patients").execute(db.pool()).await.unwrap();
        service.signup(signup_command("alice")).await.expect("Username should be free");
    }
}
