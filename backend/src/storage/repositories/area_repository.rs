use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::{Area, GeoPoint};
use crate::storage::connection::DbConnection;
use crate::storage::traits::AreaStorage;

/// Repository for billing areas
#[derive(Clone)]
pub struct AreaRepository {
    db: DbConnection,
}

impl AreaRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn area_from_row(row: &SqliteRow) -> Result<Area> {
        Ok(Area {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            region: row.try_get("region")?,
            location: GeoPoint::new(row.try_get("latitude")?, row.try_get("longitude")?),
            car_capacity: row.try_get::<i64, _>("car_capacity")?.try_into()?,
            motorcycle_capacity: row.try_get::<i64, _>("motorcycle_capacity")?.try_into()?,
            car_rate: row.try_get("car_rate")?,
            motorcycle_rate: row.try_get("motorcycle_rate")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

#[async_trait]
impl AreaStorage for AreaRepository {
    /// Insert or replace an area definition
    async fn store_area(&self, area: &Area) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO areas (id, name, region, latitude, longitude, car_capacity,
                               motorcycle_capacity, car_rate, motorcycle_rate, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                region = excluded.region,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                car_capacity = excluded.car_capacity,
                motorcycle_capacity = excluded.motorcycle_capacity,
                car_rate = excluded.car_rate,
                motorcycle_rate = excluded.motorcycle_rate,
                is_active = excluded.is_active
            "#,
        )
        .bind(&area.id)
        .bind(&area.name)
        .bind(&area.region)
        .bind(area.location.latitude)
        .bind(area.location.longitude)
        .bind(i64::from(area.car_capacity))
        .bind(i64::from(area.motorcycle_capacity))
        .bind(area.car_rate)
        .bind(area.motorcycle_rate)
        .bind(area.is_active)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_area(&self, area_id: &str) -> Result<Option<Area>> {
        let row = sqlx::query("SELECT * FROM areas WHERE id = ?")
            .bind(area_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::area_from_row).transpose()
    }

    async fn get_active_areas(&self) -> Result<Vec<Area>> {
        let rows = sqlx::query("SELECT * FROM areas WHERE is_active = TRUE ORDER BY name, id")
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::area_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::test_area;

    #[tokio::test]
    async fn test_store_and_reload_area() {
        let repo = AreaRepository::new(DbConnection::init_test().await.unwrap());
        let area = test_area("a1", 5000.0, 3000.0);
        repo.store_area(&area).await.unwrap();

        assert_eq!(repo.get_area("a1").await.unwrap(), Some(area));
        assert_eq!(repo.get_area("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_area_updates_rates_in_place() {
        let repo = AreaRepository::new(DbConnection::init_test().await.unwrap());
        let mut area = test_area("a1", 5000.0, 3000.0);
        repo.store_area(&area).await.unwrap();
        area.car_rate = 7000.0;
        repo.store_area(&area).await.unwrap();

        assert_eq!(repo.get_area("a1").await.unwrap().unwrap().car_rate, 7000.0);
    }

    #[tokio::test]
    async fn test_inactive_areas_are_not_listed() {
        let repo = AreaRepository::new(DbConnection::init_test().await.unwrap());
        let open = test_area("open", 5000.0, 3000.0);
        let mut closed = test_area("closed", 5000.0, 3000.0);
        closed.is_active = false;
        repo.store_area(&open).await.unwrap();
        repo.store_area(&closed).await.unwrap();

        let ids: Vec<String> = repo
            .get_active_areas()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["open".to_string()]);
    }
}
