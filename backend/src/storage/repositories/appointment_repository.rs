use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::from_unix;
use crate::domain::models::appointment::NewAppointment;
use crate::domain::models::{Appointment, AppointmentDetails, AppointmentStatus};
use crate::storage::connection::SLOT_TAKEN_MARKER;

/// Raised when the store's overlap trigger rejects a write
#[derive(Debug, thiserror::Error)]
#[error("Doctor {doctor_id} already has an appointment in this time window")]
pub struct SlotTaken {
    pub doctor_id: i64,
}

const APPOINTMENT_COLUMNS: &str = r#"
    a.id, a.doctor_id, a.patient_id, a.scheduled_at, a.reason,
    a.is_approved, a.approved_at, a.prescription, a.diagnosis, a.created_at
"#;

const DETAILS_JOIN: &str = r#"
    FROM appointments a
    JOIN doctors d ON d.id = a.doctor_id
    JOIN users du ON du.id = d.user_id
    JOIN patients p ON p.id = a.patient_id
    JOIN users pu ON pu.id = p.user_id
"#;

/// Repository for appointment rows
#[derive(Clone, Default)]
pub struct AppointmentRepository;

impl AppointmentRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insert a pending appointment and return its id
    pub async fn insert(&self, conn: &mut SqliteConnection, new: &NewAppointment) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO appointments (doctor_id, patient_id, scheduled_at, reason, is_approved, created_at)
            VALUES (?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(new.doctor_id)
        .bind(new.patient_id)
        .bind(new.scheduled_at.timestamp())
        .bind(&new.reason)
        .bind(new.created_at.timestamp())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_slot_error(e, new.doctor_id))?;

        Ok(result.last_insert_rowid())
    }

    /// Get an appointment by ID
    pub async fn get(&self, conn: &mut SqliteConnection, appointment_id: i64) -> Result<Option<Appointment>> {
        let sql = format!("SELECT {} FROM appointments a WHERE a.id = ?", APPOINTMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(appointment_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_appointment).transpose()
    }

    /// Get an appointment with doctor and patient names resolved
    pub async fn get_details(
        &self,
        conn: &mut SqliteConnection,
        appointment_id: i64,
    ) -> Result<Option<AppointmentDetails>> {
        let sql = format!(
            "SELECT {}, du.username AS doctor_name, pu.username AS patient_name {} WHERE a.id = ?",
            APPOINTMENT_COLUMNS, DETAILS_JOIN
        );
        let row = sqlx::query(&sql)
            .bind(appointment_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(row_to_details).transpose()
    }

    /// Appointments of a doctor whose time lies in `[start, end]`, regardless
    /// of approval state, optionally skipping one appointment
    pub async fn find_in_window(
        &self,
        conn: &mut SqliteConnection,
        doctor_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT {} FROM appointments a
            WHERE a.doctor_id = ?
              AND a.scheduled_at BETWEEN ? AND ?
              AND (? IS NULL OR a.id != ?)
            ORDER BY a.scheduled_at ASC
            "#,
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(doctor_id)
            .bind(start.timestamp())
            .bind(end.timestamp())
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter().map(row_to_appointment).collect()
    }

    /// Flip a pending appointment to approved. Returns false when the row is
    /// missing or was already approved, so concurrent approvals cannot both win.
    pub async fn mark_approved(
        &self,
        conn: &mut SqliteConnection,
        appointment_id: i64,
        approved_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET is_approved = TRUE, approved_at = ?
            WHERE id = ? AND is_approved = FALSE
            "#,
        )
        .bind(approved_at.timestamp())
        .bind(appointment_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Write whichever clinical fields are supplied, keeping the others
    pub async fn update_details(
        &self,
        conn: &mut SqliteConnection,
        appointment_id: i64,
        prescription: Option<&str>,
        diagnosis: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET prescription = COALESCE(?, prescription),
                diagnosis = COALESCE(?, diagnosis)
            WHERE id = ?
            "#,
        )
        .bind(prescription)
        .bind(diagnosis)
        .bind(appointment_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Move an appointment to a new time
    pub async fn update_schedule(
        &self,
        conn: &mut SqliteConnection,
        appointment_id: i64,
        doctor_id: i64,
        scheduled_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE appointments SET scheduled_at = ? WHERE id = ?")
            .bind(scheduled_at.timestamp())
            .bind(appointment_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_slot_error(e, doctor_id))?;
        Ok(())
    }

    /// Delete an appointment. Returns true if a row was removed.
    pub async fn delete(&self, conn: &mut SqliteConnection, appointment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(appointment_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All appointments of a doctor, earliest first
    pub async fn list_for_doctor(
        &self,
        conn: &mut SqliteConnection,
        doctor_id: i64,
    ) -> Result<Vec<AppointmentDetails>> {
        let sql = format!(
            "SELECT {}, du.username AS doctor_name, pu.username AS patient_name {} WHERE a.doctor_id = ? ORDER BY a.scheduled_at ASC, a.id ASC",
            APPOINTMENT_COLUMNS, DETAILS_JOIN
        );
        let rows = sqlx::query(&sql).bind(doctor_id).fetch_all(&mut *conn).await?;

        rows.iter().map(row_to_details).collect()
    }

    /// All appointments of a patient, earliest first
    pub async fn list_for_patient(
        &self,
        conn: &mut SqliteConnection,
        patient_id: i64,
    ) -> Result<Vec<AppointmentDetails>> {
        let sql = format!(
            "SELECT {}, du.username AS doctor_name, pu.username AS patient_name {} WHERE a.patient_id = ? ORDER BY a.scheduled_at ASC, a.id ASC",
            APPOINTMENT_COLUMNS, DETAILS_JOIN
        );
        let rows = sqlx::query(&sql).bind(patient_id).fetch_all(&mut *conn).await?;

        rows.iter().map(row_to_details).collect()
    }
}

fn map_slot_error(err: sqlx::Error, doctor_id: i64) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.message().contains(SLOT_TAKEN_MARKER) => {
            anyhow::Error::new(SlotTaken { doctor_id })
        }
        _ => err.into(),
    }
}

fn row_to_appointment(row: &SqliteRow) -> Result<Appointment> {
    let is_approved: bool = row.try_get("is_approved")?;
    let approved_at: Option<i64> = row.try_get("approved_at")?;
    let status = match (is_approved, approved_at) {
        (true, Some(at)) => AppointmentStatus::Approved { approved_at: from_unix(at)? },
        (false, None) => AppointmentStatus::Pending,
        (flag, at) => anyhow::bail!("Inconsistent approval state: is_approved={}, approved_at={:?}", flag, at),
    };

    Ok(Appointment {
        id: row.try_get("id")?,
        doctor_id: row.try_get("doctor_id")?,
        patient_id: row.try_get("patient_id")?,
        scheduled_at: from_unix(row.try_get("scheduled_at")?)?,
        reason: row.try_get("reason")?,
        status,
        prescription: row.try_get("prescription")?,
        diagnosis: row.try_get("diagnosis")?,
        created_at: from_unix(row.try_get("created_at")?)?,
    })
}

fn row_to_details(row: &SqliteRow) -> Result<AppointmentDetails> {
    Ok(AppointmentDetails {
        appointment: row_to_appointment(row)?,
        doctor_name: row.try_get("doctor_name")?,
        patient_name: row.try_get("patient_name")?,
    })
}
