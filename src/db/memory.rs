use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::db::{
    DbError, NewTanker, NewVillage, NewWaterReading, ReadingStore, StressedReading, Tanker,
    TankerStore, Village, VillageStore, WaterReading,
};

#[derive(Default)]
struct MemoryState {
    villages: Vec<Village>,
    readings: Vec<WaterReading>,
    tankers: Vec<Tanker>,
    next_village_id: i64,
    next_reading_id: i64,
    next_tanker_id: i64,
}

impl MemoryState {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Process-local store backing all three store traits
///
/// Ids start at 1 and increase monotonically per entity. Every mutation takes
/// the write lock, so `claim_tanker` is atomic with respect to other callers.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VillageStore for InMemoryStore {
    async fn insert_village(&self, village: &NewVillage) -> Result<Village, DbError> {
        let mut state = self.state.write().await;
        let id = MemoryState::next_id(&mut state.next_village_id);
        let created = Village {
            id,
            name: village.name.clone(),
            district: village.district.clone(),
            population: village.population,
            latitude: village.latitude,
            longitude: village.longitude,
        };
        state.villages.push(created.clone());
        Ok(created)
    }

    async fn find_village(&self, id: i64) -> Result<Option<Village>, DbError> {
        let state = self.state.read().await;
        Ok(state.villages.iter().find(|v| v.id == id).cloned())
    }

    async fn find_villages(&self, offset: i64, limit: i64) -> Result<Vec<Village>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .villages
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_villages(&self) -> Result<usize, DbError> {
        Ok(self.state.read().await.villages.len())
    }
}

#[async_trait]
impl ReadingStore for InMemoryStore {
    async fn insert_reading(&self, reading: &NewWaterReading) -> Result<WaterReading, DbError> {
        let mut state = self.state.write().await;
        let id = MemoryState::next_id(&mut state.next_reading_id);
        let created = WaterReading {
            id,
            village_id: reading.village_id,
            rainfall_deviation_mm: reading.rainfall_deviation_mm,
            groundwater_level_m: reading.groundwater_level_m,
            stress_index: reading.stress_index,
            predicted_stress_index: None,
            record_date: Utc::now(),
        };
        state.readings.push(created.clone());
        Ok(created)
    }

    async fn find_readings_for_village(
        &self,
        village_id: i64,
    ) -> Result<Vec<WaterReading>, DbError> {
        let state = self.state.read().await;
        let mut readings: Vec<WaterReading> = state
            .readings
            .iter()
            .filter(|r| r.village_id == village_id)
            .cloned()
            .collect();
        readings.sort_by(|a, b| b.record_date.cmp(&a.record_date).then(b.id.cmp(&a.id)));
        Ok(readings)
    }

    #[instrument(skip(self))]
    async fn find_stressed(&self, threshold: f64) -> Result<Vec<StressedReading>, DbError> {
        let state = self.state.read().await;
        let mut rows: Vec<StressedReading> = state
            .readings
            .iter()
            .filter(|r| r.stress_index >= threshold)
            .filter_map(|r| {
                state
                    .villages
                    .iter()
                    .find(|v| v.id == r.village_id)
                    .map(|v| StressedReading {
                        village: v.clone(),
                        reading: r.clone(),
                    })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.reading
                .stress_index
                .total_cmp(&a.reading.stress_index)
                .then(a.reading.id.cmp(&b.reading.id))
        });

        debug!("Found {} stressed readings", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl TankerStore for InMemoryStore {
    async fn insert_tanker(&self, tanker: &NewTanker) -> Result<Tanker, DbError> {
        let mut state = self.state.write().await;
        if state
            .tankers
            .iter()
            .any(|t| t.license_plate == tanker.license_plate)
        {
            return Err(DbError::DuplicateLicensePlate(tanker.license_plate.clone()));
        }

        let id = MemoryState::next_id(&mut state.next_tanker_id);
        let created = Tanker {
            id,
            license_plate: tanker.license_plate.clone(),
            capacity_liters: tanker.capacity_liters,
            is_available: true,
            current_latitude: tanker.current_latitude,
            current_longitude: tanker.current_longitude,
        };
        state.tankers.push(created.clone());
        Ok(created)
    }

    async fn find_tanker(&self, id: i64) -> Result<Option<Tanker>, DbError> {
        let state = self.state.read().await;
        Ok(state.tankers.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tankers(&self) -> Result<Vec<Tanker>, DbError> {
        Ok(self.state.read().await.tankers.clone())
    }

    async fn find_eligible(&self) -> Result<Vec<Tanker>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .tankers
            .iter()
            .filter(|t| t.is_available && t.position().is_some())
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn claim_tanker(&self, id: i64) -> Result<bool, DbError> {
        let mut state = self.state.write().await;
        match state.tankers.iter_mut().find(|t| t.id == id) {
            Some(tanker) if tanker.is_available => {
                tanker.is_available = false;
                Ok(true)
            }
            _ => {
                debug!("Tanker {} could not be claimed", id);
                Ok(false)
            }
        }
    }

    async fn update_position(
        &self,
        id: i64,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Tanker>, DbError> {
        let mut state = self.state.write().await;
        Ok(state.tankers.iter_mut().find(|t| t.id == id).map(|t| {
            t.current_latitude = Some(latitude);
            t.current_longitude = Some(longitude);
            t.clone()
        }))
    }

    async fn release_tanker(&self, id: i64) -> Result<Option<Tanker>, DbError> {
        let mut state = self.state.write().await;
        Ok(state.tankers.iter_mut().find(|t| t.id == id).map(|t| {
            t.is_available = true;
            t.clone()
        }))
    }
}
