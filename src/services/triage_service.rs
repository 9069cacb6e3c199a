use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::db::{DbError, ReadingStore, StressedReading};
use crate::scoring::priority_score;

/// Stress threshold used by the crisis dashboard when none is given
pub const DEFAULT_THRESHOLD: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// One qualifying reading, ranked for tanker allocation
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TriageEntry {
    pub village_id: i64,
    pub village_name: String,
    pub district: String,
    pub population: i32,
    pub location: Location,
    pub stress_index: f64,
    pub predicted_stress_index: Option<f64>,
    pub priority_score: f64,
    pub last_recorded: DateTime<Utc>,
}

impl From<StressedReading> for TriageEntry {
    fn from(row: StressedReading) -> Self {
        let StressedReading { village, reading } = row;
        TriageEntry {
            priority_score: priority_score(reading.stress_index, village.population),
            village_id: village.id,
            village_name: village.name,
            district: village.district,
            population: village.population,
            location: Location {
                lat: village.latitude,
                lng: village.longitude,
            },
            stress_index: reading.stress_index,
            predicted_stress_index: reading.predicted_stress_index,
            last_recorded: reading.record_date,
        }
    }
}

/// Rank readings at or above `threshold` by priority score, highest first
///
/// Each reading is its own entry, so a village with several qualifying
/// readings appears once per reading. The sort is stable: entries with equal
/// priority keep their input order.
pub fn rank_readings(rows: Vec<StressedReading>, threshold: f64) -> Vec<TriageEntry> {
    let mut entries: Vec<TriageEntry> = rows
        .into_iter()
        .filter(|row| row.reading.stress_index >= threshold)
        .map(TriageEntry::from)
        .collect();

    entries.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    entries
}

#[derive(Clone)]
pub struct TriageService {
    readings: Arc<dyn ReadingStore>,
}

impl TriageService {
    pub fn new(readings: Arc<dyn ReadingStore>) -> Self {
        Self { readings }
    }

    #[instrument(skip(self))]
    pub async fn crisis_dashboard(&self, threshold: f64) -> Result<Vec<TriageEntry>, DbError> {
        let rows = self.readings.find_stressed(threshold).await?;
        let entries = rank_readings(rows, threshold);
        debug!("Ranked {} readings at threshold {}", entries.len(), threshold);
        Ok(entries)
    }
}
