use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::{Attendant, AttendantStatus};
use crate::storage::connection::DbConnection;
use crate::storage::traits::AttendantStorage;

/// Repository for attendants (jukir)
#[derive(Clone)]
pub struct AttendantRepository {
    db: DbConnection,
}

impl AttendantRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn attendant_from_row(row: &SqliteRow) -> Result<Attendant> {
        Ok(Attendant {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            area_id: row.try_get("area_id")?,
            token: row.try_get("token")?,
            status: row.try_get::<String, _>("status")?.parse()?,
        })
    }
}

#[async_trait]
impl AttendantStorage for AttendantRepository {
    async fn store_attendant(&self, attendant: &Attendant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attendants (id, code, name, area_id, token, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attendant.id)
        .bind(&attendant.code)
        .bind(&attendant.name)
        .bind(&attendant.area_id)
        .bind(&attendant.token)
        .bind(attendant.status.as_str())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_attendant(&self, attendant_id: &str) -> Result<Option<Attendant>> {
        let row = sqlx::query("SELECT * FROM attendants WHERE id = ?")
            .bind(attendant_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::attendant_from_row).transpose()
    }

    async fn get_attendant_by_token(&self, token: &str) -> Result<Option<Attendant>> {
        let row = sqlx::query("SELECT * FROM attendants WHERE token = ?")
            .bind(token)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::attendant_from_row).transpose()
    }

    async fn update_attendant_status(&self, attendant_id: &str, status: AttendantStatus) -> Result<()> {
        let result = sqlx::query("UPDATE attendants SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(attendant_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("attendant {} does not exist", attendant_id);
        }
        Ok(())
    }
}
