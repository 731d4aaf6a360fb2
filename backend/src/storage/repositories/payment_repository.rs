use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::{Payment, PaymentStatus};
use crate::storage::connection::{from_millis, to_millis, DbConnection};
use crate::storage::traits::PaymentStorage;

/// Repository for session payments
#[derive(Clone)]
pub struct PaymentRepository {
    db: DbConnection,
}

impl PaymentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub(crate) fn payment_from_row(row: &SqliteRow) -> Result<Payment> {
        Ok(Payment {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            amount: row.try_get("amount")?,
            method: row.try_get("method")?,
            confirmed_by: row.try_get("confirmed_by")?,
            confirmed_at: row
                .try_get::<Option<i64>, _>("confirmed_at")?
                .map(from_millis)
                .transpose()?,
            status: row.try_get::<String, _>("status")?.parse()?,
        })
    }
}

#[async_trait]
impl PaymentStorage for PaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, session_id, amount, method, confirmed_by, confirmed_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.session_id)
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(&payment.confirmed_by)
        .bind(payment.confirmed_at.map(to_millis))
        .bind(payment.status.as_str())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_payment_by_session(&self, session_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::payment_from_row).transpose()
    }

    async fn update_payment(&self, payment: &Payment) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET amount = ?, method = ?, confirmed_by = ?, confirmed_at = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(&payment.confirmed_by)
        .bind(payment.confirmed_at.map(to_millis))
        .bind(payment.status.as_str())
        .bind(&payment.id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("payment {} does not exist", payment.id);
        }
        Ok(())
    }

    async fn get_revenue_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM payments
            WHERE status = ? AND confirmed_at >= ? AND confirmed_at < ?
            ORDER BY confirmed_at, id
            "#,
        )
        .bind(PaymentStatus::Paid.as_str())
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::payment_from_row).collect()
    }
}
