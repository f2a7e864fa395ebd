use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::domain::models::Patient;

const PATIENT_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.birth_date, p.phone_number, u.username, u.email
    FROM patients p
    JOIN users u ON u.id = p.user_id
"#;

/// Repository for patient profiles
#[derive(Clone, Default)]
pub struct PatientRepository;

impl PatientRepository {
    pub fn new() -> Self {
        Self
    }

    /// Attach a patient profile to an existing user account
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        birth_date: NaiveDate,
        phone_number: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO patients (user_id, birth_date, phone_number)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(birth_date.format("%Y-%m-%d").to_string())
        .bind(phone_number)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a patient by ID
    pub async fn get(&self, conn: &mut SqliteConnection, patient_id: i64) -> Result<Option<Patient>> {
        let sql = format!("{} WHERE p.id = ?", PATIENT_SELECT);
        let row = sqlx::query(&sql)
            .bind(patient_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_patient).transpose()
    }

    /// Get the patient profile owned by a user account
    pub async fn get_by_user(&self, conn: &mut SqliteConnection, user_id: i64) -> Result<Option<Patient>> {
        let sql = format!("{} WHERE p.user_id = ?", PATIENT_SELECT);
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_patient).transpose()
    }
}

fn row_to_patient(row: &SqliteRow) -> Result<Patient> {
    let birth_date: String = row.try_get("birth_date")?;
    Ok(Patient {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        birth_date: NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
            .with_context(|| format!("Stored birth date is malformed: {}", birth_date))?,
        phone_number: row.try_get("phone_number")?,
    })
}
