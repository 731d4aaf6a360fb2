use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::repositories::{AreaRepository, AttendantRepository, PaymentRepository, SessionRepository};
use super::traits::Connection;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:jukir.db";

/// True when `err` comes from a unique constraint, such as a second active
/// session for the same plate written by another process
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    })
}

/// DbConnection owns the SQLite pool shared by every repository
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and set up the schema
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{}'", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database '{}'", url))?;

        Self::setup_schema(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Private in-memory database; one connection keeps it alive
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS areas (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                region TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                car_capacity INTEGER NOT NULL DEFAULT 0,
                motorcycle_capacity INTEGER NOT NULL DEFAULT 0,
                car_rate REAL NOT NULL,
                motorcycle_rate REAL NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendants (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                area_id TEXT NOT NULL,
                token TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL CHECK (status IN ('pending', 'active', 'inactive')),
                FOREIGN KEY (area_id) REFERENCES areas (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS parking_sessions (
                id TEXT PRIMARY KEY,
                area_id TEXT NOT NULL,
                attendant_id TEXT,
                token TEXT,
                vehicle_type TEXT NOT NULL CHECK (vehicle_type IN ('car', 'motorcycle')),
                plate_number TEXT,
                is_manual BOOLEAN NOT NULL DEFAULT FALSE,
                checkin_time INTEGER NOT NULL,
                checkout_time INTEGER,
                duration_minutes INTEGER,
                total_cost REAL,
                payment_status TEXT NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY (area_id) REFERENCES areas (id),
                FOREIGN KEY (attendant_id) REFERENCES attendants (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // One active session per plate, enforced by storage as well as by the service
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_active_plate
            ON parking_sessions(plate_number)
            WHERE status = 'active' AND plate_number IS NOT NULL;
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_token_status
            ON parking_sessions(token, status);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_area_checkin
            ON parking_sessions(area_id, checkin_time);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_attendant_checkin
            ON parking_sessions(attendant_id, checkin_time);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL UNIQUE,
                amount REAL NOT NULL,
                method TEXT NOT NULL,
                confirmed_by TEXT,
                confirmed_at INTEGER,
                status TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES parking_sessions (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_payments_confirmed_at
            ON payments(status, confirmed_at);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl Connection for DbConnection {
    type SessionRepository = SessionRepository;
    type AreaRepository = AreaRepository;
    type AttendantRepository = AttendantRepository;
    type PaymentRepository = PaymentRepository;

    fn create_session_repository(&self) -> Self::SessionRepository {
        SessionRepository::new(self.clone())
    }

    fn create_area_repository(&self) -> Self::AreaRepository {
        AreaRepository::new(self.clone())
    }

    fn create_attendant_repository(&self) -> Self::AttendantRepository {
        AttendantRepository::new(self.clone())
    }

    fn create_payment_repository(&self) -> Self::PaymentRepository {
        PaymentRepository::new(self.clone())
    }
}

pub(crate) fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow::anyhow!("timestamp {} out of range", millis))
}
