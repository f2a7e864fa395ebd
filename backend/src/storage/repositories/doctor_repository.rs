use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::domain::models::Doctor;

const DOCTOR_SELECT: &str = r#"
    SELECT d.id, d.user_id, d.specialty, u.username, u.email
    FROM doctors d
    JOIN users u ON u.id = d.user_id
"#;

/// Repository for doctor profiles
#[derive(Clone, Default)]
pub struct DoctorRepository;

impl DoctorRepository {
    pub fn new() -> Self {
        Self
    }

    /// Attach a doctor profile to an existing user account
    pub async fn insert(&self, conn: &mut SqliteConnection, user_id: i64, specialty: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO doctors (user_id, specialty)
            VALUES (?, ?)
            "#,
        )
        .bind(user_id)
        .bind(specialty)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a doctor by ID
    pub async fn get(&self, conn: &mut SqliteConnection, doctor_id: i64) -> Result<Option<Doctor>> {
        let sql = format!("{} WHERE d.id = ?", DOCTOR_SELECT);
        let row = sqlx::query(&sql)
            .bind(doctor_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_doctor).transpose()
    }

    /// Get the doctor profile owned by a user account
    pub async fn get_by_user(&self, conn: &mut SqliteConnection, user_id: i64) -> Result<Option<Doctor>> {
        let sql = format!("{} WHERE d.user_id = ?", DOCTOR_SELECT);
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_doctor).transpose()
    }

    /// List all doctors ordered by username
    pub async fn list(&self, conn: &mut SqliteConnection) -> Result<Vec<Doctor>> {
        let sql = format!("{} ORDER BY u.username ASC", DOCTOR_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        rows.iter().map(row_to_doctor).collect()
    }

    /// Change a doctor's specialty. Returns false if the doctor does not exist.
    pub async fn update_specialty(&self, conn: &mut SqliteConnection, doctor_id: i64, specialty: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE doctors SET specialty = ? WHERE id = ?")
            .bind(specialty)
            .bind(doctor_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_doctor(row: &SqliteRow) -> Result<Doctor> {
    Ok(Doctor {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        specialty: row.try_get("specialty")?,
    })
}
