use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{DbError, NewTanker, Tanker, TankerStore};

#[derive(Clone)]
pub struct TankerRepository {
    pool: PgPool,
}

impl TankerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(e: sqlx::Error, license_plate: &str) -> DbError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return DbError::DuplicateLicensePlate(license_plate.to_string());
        }
    }
    error!(license_plate = %license_plate, error = %e, "Failed to insert tanker");
    DbError::SqlxError(e)
}

#[async_trait]
impl TankerStore for TankerRepository {
    #[instrument(skip(self, tanker), fields(license_plate = %tanker.license_plate))]
    async fn insert_tanker(&self, tanker: &NewTanker) -> Result<Tanker, DbError> {
        let created = sqlx::query_as::<_, Tanker>(
            r#"
            INSERT INTO tankers (license_plate, capacity_liters, is_available, current_latitude, current_longitude)
            VALUES ($1, $2, TRUE, $3, $4)
            RETURNING id, license_plate, capacity_liters, is_available, current_latitude, current_longitude
            "#,
        )
        .bind(&tanker.license_plate)
        .bind(tanker.capacity_liters)
        .bind(tanker.current_latitude)
        .bind(tanker.current_longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &tanker.license_plate))?;

        info!("Registered tanker {} ({})", created.id, created.license_plate);
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_tanker(&self, id: i64) -> Result<Option<Tanker>, DbError> {
        let tanker = sqlx::query_as::<_, Tanker>(
            r#"
            SELECT id, license_plate, capacity_liters, is_available, current_latitude, current_longitude
            FROM tankers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tanker)
    }

    #[instrument(skip(self))]
    async fn find_tankers(&self) -> Result<Vec<Tanker>, DbError> {
        let tankers = sqlx::query_as::<_, Tanker>(
            r#"
            SELECT id, license_plate, capacity_liters, is_available, current_latitude, current_longitude
            FROM tankers
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} tankers", tankers.len());
        Ok(tankers)
    }

    #[instrument(skip(self))]
    async fn find_eligible(&self) -> Result<Vec<Tanker>, DbError> {
        let tankers = sqlx::query_as::<_, Tanker>(
            r#"
            SELECT id, license_plate, capacity_liters, is_available, current_latitude, current_longitude
            FROM tankers
            WHERE is_available
              AND current_latitude IS NOT NULL
              AND current_longitude IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} eligible tankers", tankers.len());
        Ok(tankers)
    }

    /// Compare-and-swap on `is_available`. Concurrent updates of the same row
    /// serialize on the row lock and the loser re-checks the predicate.
    #[instrument(skip(self))]
    async fn claim_tanker(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE tankers
            SET is_available = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_available = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() == 1;
        if !claimed {
            warn!("Tanker {} was no longer available at claim time", id);
        }
        Ok(claimed)
    }

    #[instrument(skip(self))]
    async fn update_position(
        &self,
        id: i64,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Tanker>, DbError> {
        let tanker = sqlx::query_as::<_, Tanker>(
            r#"
            UPDATE tankers
            SET current_latitude = $2, current_longitude = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, license_plate, capacity_liters, is_available, current_latitude, current_longitude
            "#,
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tanker)
    }

    #[instrument(skip(self))]
    async fn release_tanker(&self, id: i64) -> Result<Option<Tanker>, DbError> {
        let tanker = sqlx::query_as::<_, Tanker>(
            r#"
            UPDATE tankers
            SET is_available = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, license_plate, capacity_liters, is_available, current_latitude, current_longitude
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref t) = tanker {
            info!("Tanker {} released and available again", t.license_plate);
        }
        Ok(tanker)
    }
}
