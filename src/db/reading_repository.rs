use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewWaterReading, ReadingStore, StressedReading, Village, WaterReading};

#[derive(Clone)]
pub struct ReadingRepository {
    pool: PgPool,
}

impl ReadingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row for the readings/villages join
#[derive(FromRow)]
struct StressedRow {
    village_id: i64,
    name: String,
    district: String,
    population: i32,
    latitude: f64,
    longitude: f64,
    reading_id: i64,
    rainfall_deviation_mm: f64,
    groundwater_level_m: f64,
    stress_index: f64,
    predicted_stress_index: Option<f64>,
    record_date: DateTime<Utc>,
}

impl From<StressedRow> for StressedReading {
    fn from(row: StressedRow) -> Self {
        StressedReading {
            village: Village {
                id: row.village_id,
                name: row.name,
                district: row.district,
                population: row.population,
                latitude: row.latitude,
                longitude: row.longitude,
            },
            reading: WaterReading {
                id: row.reading_id,
                village_id: row.village_id,
                rainfall_deviation_mm: row.rainfall_deviation_mm,
                groundwater_level_m: row.groundwater_level_m,
                stress_index: row.stress_index,
                predicted_stress_index: row.predicted_stress_index,
                record_date: row.record_date,
            },
        }
    }
}

#[async_trait]
impl ReadingStore for ReadingRepository {
    #[instrument(skip(self, reading), fields(village_id = reading.village_id))]
    async fn insert_reading(&self, reading: &NewWaterReading) -> Result<WaterReading, DbError> {
        let created = sqlx::query_as::<_, WaterReading>(
            r#"
            INSERT INTO water_readings (village_id, rainfall_deviation_mm, groundwater_level_m, stress_index)
            VALUES ($1, $2, $3, $4)
            RETURNING id, village_id, rainfall_deviation_mm, groundwater_level_m,
                      stress_index, predicted_stress_index, record_date
            "#,
        )
        .bind(reading.village_id)
        .bind(reading.rainfall_deviation_mm)
        .bind(reading.groundwater_level_m)
        .bind(reading.stress_index)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Inserted reading {} for village {} with stress index {:.2}",
            created.id, created.village_id, created.stress_index
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_readings_for_village(
        &self,
        village_id: i64,
    ) -> Result<Vec<WaterReading>, DbError> {
        let readings = sqlx::query_as::<_, WaterReading>(
            r#"
            SELECT id, village_id, rainfall_deviation_mm, groundwater_level_m,
                   stress_index, predicted_stress_index, record_date
            FROM water_readings
            WHERE village_id = $1
            ORDER BY record_date DESC, id DESC
            "#,
        )
        .bind(village_id)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} readings for village {}", readings.len(), village_id);
        Ok(readings)
    }

    #[instrument(skip(self))]
    async fn find_stressed(&self, threshold: f64) -> Result<Vec<StressedReading>, DbError> {
        debug!("Querying readings with stress index >= {}", threshold);

        let rows = sqlx::query_as::<_, StressedRow>(
            r#"
            SELECT v.id AS village_id, v.name, v.district, v.population, v.latitude, v.longitude,
                   w.id AS reading_id, w.rainfall_deviation_mm, w.groundwater_level_m,
                   w.stress_index, w.predicted_stress_index, w.record_date
            FROM water_readings w
            JOIN villages v ON v.id = w.village_id
            WHERE w.stress_index >= $1
            ORDER BY w.stress_index DESC, w.id ASC
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} stressed readings", rows.len());
        Ok(rows.into_iter().map(StressedReading::from).collect())
    }
}
