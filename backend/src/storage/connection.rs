use anyhow::{Context, Result};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqliteConnection, SqlitePool};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::models::appointment::CONFLICT_WINDOW_SECONDS;

/// Name of the error raised by the overlap triggers. Matched by the
/// appointment repository to report a typed conflict.
pub const SLOT_TAKEN_MARKER: &str = "appointment_slot_taken";

/// DbConnection owns the SQLite pool and the schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        Self::connect(url, SqlitePoolOptions::new()).await
    }

    /// Private in-memory database with a unique name. Used by tests and by
    /// the `memory` database setting.
    pub async fn init_in_memory() -> Result<Self> {
        let db_id = uuid::Uuid::new_v4().simple().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", db_id);

        // The database is freed with its last connection, so the pool keeps
        // exactly one open for good. Writers queue on the pool.
        let options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);

        Self::connect(&db_url, options).await
    }

    async fn connect(url: &str, options: SqlitePoolOptions) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("Failed to create database at {}", url))?;
        }

        let pool = options
            .after_release(|conn, _meta| {
                Box::pin(async move {
                    // Errors with "no transaction is active" unless a write
                    // transaction was dropped before commit
                    if sqlx::query("ROLLBACK").execute(&mut *conn).await.is_ok() {
                        debug!("Rolled back an uncommitted transaction on release");
                    }
                    Ok::<_, sqlx::Error>(true)
                })
            })
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::setup_schema(&pool).await?;

        info!("Database ready at {}", url);
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check out a single connection for a sequence of reads
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Start a unit of work that writes. Dropping the transaction without
    /// committing rolls every statement back.
    pub async fn begin_write(&self) -> Result<WriteTransaction> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(WriteTransaction { conn })
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // Identity store
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS doctors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                specialty TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                birth_date TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // approved_at is present exactly when is_approved is set, and clinical
        // details may only be written to approved rows.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doctor_id INTEGER NOT NULL,
                patient_id INTEGER NOT NULL,
                scheduled_at INTEGER NOT NULL,
                reason TEXT NOT NULL,
                is_approved BOOLEAN NOT NULL DEFAULT FALSE,
                approved_at INTEGER,
                prescription TEXT,
                diagnosis TEXT,
                created_at INTEGER NOT NULL,
                CHECK ((is_approved = 0 AND approved_at IS NULL) OR (is_approved = 1 AND approved_at IS NOT NULL)),
                CHECK (is_approved = 1 OR (prescription IS NULL AND diagnosis IS NULL)),
                FOREIGN KEY (doctor_id) REFERENCES doctors (id) ON DELETE CASCADE,
                FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Range scans for the conflict window
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_appointments_doctor_time
            ON appointments(doctor_id, scheduled_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_appointments_patient
            ON appointments(patient_id);
            "#,
        )
        .execute(pool)
        .await?;

        // Exclusion constraint on (doctor, time window). Holds for any writer,
        // including ones that skip the scheduling service.
        let insert_guard = format!(
            r#"
            CREATE TRIGGER IF NOT EXISTS appointments_no_overlap_insert
            BEFORE INSERT ON appointments
            WHEN EXISTS (
                SELECT 1 FROM appointments
                WHERE doctor_id = NEW.doctor_id
                  AND scheduled_at BETWEEN NEW.scheduled_at - {window} AND NEW.scheduled_at + {window}
            )
            BEGIN
                SELECT RAISE(ABORT, '{marker}');
            END;
            "#,
            window = CONFLICT_WINDOW_SECONDS,
            marker = SLOT_TAKEN_MARKER,
        );
        sqlx::query(&insert_guard).execute(pool).await?;

        let update_guard = format!(
            r#"
            CREATE TRIGGER IF NOT EXISTS appointments_no_overlap_update
            BEFORE UPDATE OF scheduled_at, doctor_id ON appointments
            WHEN EXISTS (
                SELECT 1 FROM appointments
                WHERE doctor_id = NEW.doctor_id
                  AND id != NEW.id
                  AND scheduled_at BETWEEN NEW.scheduled_at - {window} AND NEW.scheduled_at + {window}
            )
            BEGIN
                SELECT RAISE(ABORT, '{marker}');
            END;
            "#,
            window = CONFLICT_WINDOW_SECONDS,
            marker = SLOT_TAKEN_MARKER,
        );
        sqlx::query(&update_guard).execute(pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_notifications_patient_unread
            ON notifications(patient_id, is_read);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

/// Transaction opened with `BEGIN IMMEDIATE`.
///
/// The write lock is taken before the first read, so concurrent writers wait
/// on the busy timeout instead of failing when a read lock cannot be
/// upgraded. A transaction that is never committed is rolled back by the
/// pool when its connection is released.
pub struct WriteTransaction {
    conn: PoolConnection<Sqlite>,
}

impl WriteTransaction {
    pub async fn commit(mut self) -> Result<()> {
        sqlx::query("COMMIT").execute(&mut *self.conn).await?;
        Ok(())
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &self.conn
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}
