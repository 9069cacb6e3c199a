use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::db::{NewVillage, NewWaterReading, ReadingStore, Village, VillageStore, WaterReading};
use crate::scoring::stress_index;
use crate::services::error::{validate_coordinates, ServiceError};

// Pagination types (used by API)
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100) as i64
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VillageListResponse {
    pub total_villages: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub villages: Vec<Village>,
}

/// Raw field data for one village
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WaterDataRequest {
    pub village_id: i64,
    /// Negative means less rain than baseline
    pub rainfall_deviation_mm: f64,
    /// Depth to the water table
    pub groundwater_level_m: f64,
}

#[derive(Clone)]
pub struct VillageService {
    villages: Arc<dyn VillageStore>,
    readings: Arc<dyn ReadingStore>,
}

impl VillageService {
    pub fn new(villages: Arc<dyn VillageStore>, readings: Arc<dyn ReadingStore>) -> Self {
        Self { villages, readings }
    }

    #[instrument(skip(self, village), fields(name = %village.name))]
    pub async fn create_village(&self, village: &NewVillage) -> Result<Village, ServiceError> {
        if village.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".to_string()));
        }
        if village.district.trim().is_empty() {
            return Err(ServiceError::Validation(
                "district must not be empty".to_string(),
            ));
        }
        if village.population < 0 {
            return Err(ServiceError::Validation(format!(
                "population must be non-negative, got {}",
                village.population
            )));
        }
        validate_coordinates(village.latitude, village.longitude)?;

        let created = self.villages.insert_village(village).await?;
        info!("Village {} registered in district {}", created.name, created.district);
        Ok(created)
    }

    /// Get paginated villages with metadata
    pub async fn get_villages_paginated(
        &self,
        params: &PaginationParams,
    ) -> Result<VillageListResponse, ServiceError> {
        let total_villages = self.villages.count_villages().await?;
        let villages = self
            .villages
            .find_villages(params.offset(), params.limit())
            .await?;

        let page_size = params.limit() as u32;
        let total_pages = ((total_villages as f64) / (page_size as f64)).ceil() as u32;

        Ok(VillageListResponse {
            total_villages,
            page: params.page,
            page_size,
            total_pages,
            has_next_page: params.page < total_pages,
            has_prev_page: params.page > 1,
            villages,
        })
    }

    /// Score and store a new reading for an existing village
    #[instrument(skip(self, data), fields(village_id = data.village_id))]
    pub async fn record_reading(
        &self,
        data: &WaterDataRequest,
    ) -> Result<WaterReading, ServiceError> {
        if !data.rainfall_deviation_mm.is_finite() || !data.groundwater_level_m.is_finite() {
            return Err(ServiceError::Validation(
                "readings must be finite numbers".to_string(),
            ));
        }

        if self.villages.find_village(data.village_id).await?.is_none() {
            warn!("Reading submitted for unknown village {}", data.village_id);
            return Err(ServiceError::VillageNotFound(data.village_id));
        }

        let reading = NewWaterReading {
            village_id: data.village_id,
            rainfall_deviation_mm: data.rainfall_deviation_mm,
            groundwater_level_m: data.groundwater_level_m,
            stress_index: stress_index(data.rainfall_deviation_mm, data.groundwater_level_m),
        };

        Ok(self.readings.insert_reading(&reading).await?)
    }

    /// Reading history for a village, newest first
    pub async fn get_readings(&self, village_id: i64) -> Result<Vec<WaterReading>, ServiceError> {
        if self.villages.find_village(village_id).await?.is_none() {
            return Err(ServiceError::VillageNotFound(village_id));
        }
        Ok(self.readings.find_readings_for_village(village_id).await?)
    }
}
