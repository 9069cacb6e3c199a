use async_trait::async_trait;

use crate::db::{
    DbError, NewTanker, NewVillage, NewWaterReading, StressedReading, Tanker, Village, WaterReading,
};

#[async_trait]
pub trait VillageStore: Send + Sync {
    async fn insert_village(&self, village: &NewVillage) -> Result<Village, DbError>;

    async fn find_village(&self, id: i64) -> Result<Option<Village>, DbError>;

    /// Villages ordered by id
    async fn find_villages(&self, offset: i64, limit: i64) -> Result<Vec<Village>, DbError>;

    async fn count_villages(&self) -> Result<usize, DbError>;
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append a reading. Readings are never updated afterwards.
    async fn insert_reading(&self, reading: &NewWaterReading) -> Result<WaterReading, DbError>;

    /// Readings for one village, newest first
    async fn find_readings_for_village(&self, village_id: i64)
        -> Result<Vec<WaterReading>, DbError>;

    /// Every reading with `stress_index >= threshold` joined with its village,
    /// ordered by stress index descending, then reading id ascending
    async fn find_stressed(&self, threshold: f64) -> Result<Vec<StressedReading>, DbError>;
}

#[async_trait]
pub trait TankerStore: Send + Sync {
    /// Fails with `DbError::DuplicateLicensePlate` if the plate is taken
    async fn insert_tanker(&self, tanker: &NewTanker) -> Result<Tanker, DbError>;

    async fn find_tanker(&self, id: i64) -> Result<Option<Tanker>, DbError>;

    /// All tankers ordered by id
    async fn find_tankers(&self) -> Result<Vec<Tanker>, DbError>;

    /// Available tankers with a known position, ordered by id
    async fn find_eligible(&self) -> Result<Vec<Tanker>, DbError>;

    /// Flip availability true -> false if and only if it is currently true.
    ///
    /// Returns `false` when the tanker was already unavailable (or does not
    /// exist), meaning another caller claimed it first.
    async fn claim_tanker(&self, id: i64) -> Result<bool, DbError>;

    async fn update_position(
        &self,
        id: i64,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Tanker>, DbError>;

    /// Mark a tanker available again
    async fn release_tanker(&self, id: i64) -> Result<Option<Tanker>, DbError>;
}
