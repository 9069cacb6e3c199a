use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Database entity models
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct Village {
    pub id: i64,
    pub name: String,
    pub district: String,
    pub population: i32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct WaterReading {
    pub id: i64,
    pub village_id: i64,
    pub rainfall_deviation_mm: f64,
    pub groundwater_level_m: f64,
    pub stress_index: f64,
    /// Reserved for a forecast model; never computed here
    pub predicted_stress_index: Option<f64>,
    pub record_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct Tanker {
    pub id: i64,
    pub license_plate: String,
    pub capacity_liters: i32,
    pub is_available: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
}

impl Tanker {
    /// Current position, if the tanker has reported both coordinates
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.current_latitude, self.current_longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// A qualifying reading joined with its village
#[derive(Debug, Clone, PartialEq)]
pub struct StressedReading {
    pub village: Village,
    pub reading: WaterReading,
}

// Insert payloads (before ids and timestamps are assigned)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewVillage {
    pub name: String,
    pub district: String,
    pub population: i32,
    pub latitude: f64,
    pub longitude: f64,
}

/// Reading with its stress index already computed
#[derive(Debug, Clone)]
pub struct NewWaterReading {
    pub village_id: i64,
    pub rainfall_deviation_mm: f64,
    pub groundwater_level_m: f64,
    pub stress_index: f64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTanker {
    pub license_plate: String,
    pub capacity_liters: i32,
    #[serde(default)]
    pub current_latitude: Option<f64>,
    #[serde(default)]
    pub current_longitude: Option<f64>,
}
