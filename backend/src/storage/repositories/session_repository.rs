use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};

use crate::domain::models::{Payment, Session, SessionStatus};
use crate::storage::connection::{from_millis, to_millis, DbConnection};
use crate::storage::traits::SessionStorage;

const INSERT_SESSION: &str = r#"
    INSERT INTO parking_sessions (id, area_id, attendant_id, token, vehicle_type, plate_number,
                                  is_manual, checkin_time, checkout_time, duration_minutes,
                                  total_cost, payment_status, status)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_SESSION: &str = r#"
    UPDATE parking_sessions
    SET area_id = ?, attendant_id = ?, token = ?, vehicle_type = ?, plate_number = ?,
        is_manual = ?, checkin_time = ?, checkout_time = ?, duration_minutes = ?,
        total_cost = ?, payment_status = ?, status = ?
    WHERE id = ?
"#;

const INSERT_PAYMENT: &str = r#"
    INSERT INTO payments (id, session_id, amount, method, confirmed_by, confirmed_at, status)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const UPSERT_PAYMENT: &str = r#"
    INSERT INTO payments (id, session_id, amount, method, confirmed_by, confirmed_at, status)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(session_id) DO UPDATE SET
        amount = excluded.amount,
        method = excluded.method,
        confirmed_by = excluded.confirmed_by,
        confirmed_at = excluded.confirmed_at,
        status = excluded.status
"#;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// Repository for parking sessions, including the paired payment writes
#[derive(Clone)]
pub struct SessionRepository {
    db: DbConnection,
}

impl SessionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn session_from_row(row: &SqliteRow) -> Result<Session> {
        Ok(Session {
            id: row.try_get("id")?,
            area_id: row.try_get("area_id")?,
            attendant_id: row.try_get("attendant_id")?,
            token: row.try_get("token")?,
            vehicle_type: row
                .try_get::<String, _>("vehicle_type")?
                .parse()
                .map_err(anyhow::Error::from)?,
            plate_number: row.try_get("plate_number")?,
            is_manual: row.try_get("is_manual")?,
            checkin_time: from_millis(row.try_get("checkin_time")?)?,
            checkout_time: row
                .try_get::<Option<i64>, _>("checkout_time")?
                .map(from_millis)
                .transpose()?,
            duration_minutes: row.try_get("duration_minutes")?,
            total_cost: row.try_get("total_cost")?,
            payment_status: row.try_get::<String, _>("payment_status")?.parse()?,
            status: row.try_get::<String, _>("status")?.parse()?,
        })
    }

    fn bind_insert<'q>(session: &'q Session) -> SqliteQuery<'q> {
        sqlx::query(INSERT_SESSION)
            .bind(&session.id)
            .bind(&session.area_id)
            .bind(&session.attendant_id)
            .bind(&session.token)
            .bind(session.vehicle_type.as_str())
            .bind(&session.plate_number)
            .bind(session.is_manual)
            .bind(to_millis(session.checkin_time))
            .bind(session.checkout_time.map(to_millis))
            .bind(session.duration_minutes)
            .bind(session.total_cost)
            .bind(session.payment_status.as_str())
            .bind(session.status.as_str())
    }

    fn bind_update<'q>(session: &'q Session) -> SqliteQuery<'q> {
        sqlx::query(UPDATE_SESSION)
            .bind(&session.area_id)
            .bind(&session.attendant_id)
            .bind(&session.token)
            .bind(session.vehicle_type.as_str())
            .bind(&session.plate_number)
            .bind(session.is_manual)
            .bind(to_millis(session.checkin_time))
            .bind(session.checkout_time.map(to_millis))
            .bind(session.duration_minutes)
            .bind(session.total_cost)
            .bind(session.payment_status.as_str())
            .bind(session.status.as_str())
            .bind(&session.id)
    }

    fn bind_payment<'q>(sql: &'q str, payment: &'q Payment) -> SqliteQuery<'q> {
        sqlx::query(sql)
            .bind(&payment.id)
            .bind(&payment.session_id)
            .bind(payment.amount)
            .bind(&payment.method)
            .bind(&payment.confirmed_by)
            .bind(payment.confirmed_at.map(to_millis))
            .bind(payment.status.as_str())
    }
}

#[async_trait]
impl SessionStorage for SessionRepository {
    async fn create_session(&self, session: &Session) -> Result<()> {
        Self::bind_insert(session).execute(self.db.pool()).await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM parking_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn get_active_by_plate(&self, plate_number: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM parking_sessions
            WHERE plate_number = ? AND status = ? AND checkout_time IS NULL
            ORDER BY checkin_time DESC
            LIMIT 1
            "#,
        )
        .bind(plate_number)
        .bind(SessionStatus::Active.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn get_active_by_token(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM parking_sessions
            WHERE token = ? AND status = ? AND checkout_time IS NULL
            ORDER BY checkin_time DESC
            LIMIT 1
            "#,
        )
        .bind(token)
        .bind(SessionStatus::Active.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn update_session(&self, session: &Session) -> Result<()> {
        let result = Self::bind_update(session).execute(self.db.pool()).await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("session {} does not exist", session.id);
        }
        Ok(())
    }

    async fn get_sessions_by_area(
        &self,
        area_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM parking_sessions
            WHERE area_id = ?
              AND checkin_time < ?
              AND (checkout_time IS NULL OR checkout_time >= ?)
            ORDER BY checkin_time, id
            "#,
        )
        .bind(area_id)
        .bind(to_millis(end))
        .bind(to_millis(start))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::session_from_row).collect()
    }

    async fn get_sessions_by_attendant(
        &self,
        attendant_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM parking_sessions
            WHERE attendant_id = ?
              AND checkin_time < ?
              AND (checkout_time IS NULL OR checkout_time >= ?)
            ORDER BY checkin_time, id
            "#,
        )
        .bind(attendant_id)
        .bind(to_millis(end))
        .bind(to_millis(start))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::session_from_row).collect()
    }

    async fn count_active_by_attendant(&self, attendant_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM parking_sessions WHERE attendant_id = ? AND status = ?",
        )
        .bind(attendant_id)
        .bind(SessionStatus::Active.as_str())
        .fetch_one(self.db.pool())
        .await?;
        Ok(count.try_into()?)
    }

    async fn record_checkin(&self, session: &Session, payment: &Payment) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        Self::bind_insert(session).execute(&mut *tx).await?;
        Self::bind_payment(INSERT_PAYMENT, payment).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn record_checkout(&self, session: &Session, payment: &Payment) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        let result = Self::bind_update(session).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("session {} does not exist", session.id);
        }
        Self::bind_payment(UPSERT_PAYMENT, payment).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
