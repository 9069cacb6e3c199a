use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewVillage, Village, VillageStore};

#[derive(Clone)]
pub struct VillageRepository {
    pool: PgPool,
}

impl VillageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VillageStore for VillageRepository {
    #[instrument(skip(self, village), fields(name = %village.name))]
    async fn insert_village(&self, village: &NewVillage) -> Result<Village, DbError> {
        let created = sqlx::query_as::<_, Village>(
            r#"
            INSERT INTO villages (name, district, population, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, district, population, latitude, longitude
            "#,
        )
        .bind(&village.name)
        .bind(&village.district)
        .bind(village.population)
        .bind(village.latitude)
        .bind(village.longitude)
        .fetch_one(&self.pool)
        .await?;

        info!("Created village {} ({})", created.id, created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_village(&self, id: i64) -> Result<Option<Village>, DbError> {
        let village = sqlx::query_as::<_, Village>(
            r#"
            SELECT id, name, district, population, latitude, longitude
            FROM villages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if village.is_none() {
            debug!("Village {} not found", id);
        }

        Ok(village)
    }

    #[instrument(skip(self))]
    async fn find_villages(&self, offset: i64, limit: i64) -> Result<Vec<Village>, DbError> {
        debug!("Querying villages with offset={}, limit={}", offset, limit);

        let villages = sqlx::query_as::<_, Village>(
            r#"
            SELECT id, name, district, population, latitude, longitude
            FROM villages
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} villages", villages.len());
        Ok(villages)
    }

    #[instrument(skip(self))]
    async fn count_villages(&self) -> Result<usize, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM villages")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }
}
