//! Fixtures shared by the unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::storage::{DbConnection, DoctorRepository, IdentityStore, PatientRepository, UserRepository};

/// A fixed day so tests never depend on the wall clock
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
}

/// Create a user plus doctor profile and return the doctor id
pub async fn seed_doctor(db: &DbConnection, username: &str) -> i64 {
    let user = UserRepository::new(db.clone())
        .create_user(username, &format!("{}@clinic.test", username), "password")
        .await
        .expect("Failed to create doctor user")
        .expect("Doctor username already taken");

    let mut conn = db.acquire().await.expect("Failed to acquire connection");
    DoctorRepository::new()
        .insert(&mut conn, user.id, "General Practice")
        .await
        .expect("Failed to create doctor")
}

/// Create a user plus patient profile and return the patient id
pub async fn seed_patient(db: &DbConnection, username: &str) -> i64 {
    let user = UserRepository::new(db.clone())
        .create_user(username, &format!("{}@mail.test", username), "password")
        .await
        .expect("Failed to create patient user")
        .expect("Patient username already taken");

    let mut conn = db.acquire().await.expect("Failed to acquire connection");
    PatientRepository::new()
        .insert(
            &mut conn,
            user.id,
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            "+1 555 0100",
        )
        .await
        .expect("Failed to create patient")
}
