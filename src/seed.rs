//! Reference dataset for demos and local development
//!
//! Five villages across Pune and Raigad districts, one reading each, and
//! three tankers (one already out on a delivery).

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::db::{DbError, NewTanker, NewVillage, NewWaterReading, Stores, Village};
use crate::scoring::stress_index;
use crate::weather::{rainfall_deviation_mm, WeatherClient};

pub struct SeedVillage {
    pub name: &'static str,
    pub district: &'static str,
    pub population: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub rainfall_deviation_mm: f64,
    pub groundwater_level_m: f64,
}

pub struct SeedTanker {
    pub license_plate: &'static str,
    pub capacity_liters: i32,
    pub is_available: bool,
    pub latitude: f64,
    pub longitude: f64,
}

// Rampur and Karjat are deliberately in heavy deficit
pub const SEED_VILLAGES: [SeedVillage; 5] = [
    SeedVillage {
        name: "Rampur",
        district: "Pune",
        population: 4500,
        latitude: 18.5204,
        longitude: 73.8567,
        rainfall_deviation_mm: -80.0,
        groundwater_level_m: 55.0,
    },
    SeedVillage {
        name: "Shivapur",
        district: "Pune",
        population: 2100,
        latitude: 18.3323,
        longitude: 73.8687,
        rainfall_deviation_mm: -4.0,
        groundwater_level_m: 14.5,
    },
    SeedVillage {
        name: "Khalapur",
        district: "Raigad",
        population: 6200,
        latitude: 18.8267,
        longitude: 73.2844,
        rainfall_deviation_mm: 6.5,
        groundwater_level_m: 11.0,
    },
    SeedVillage {
        name: "Karjat",
        district: "Raigad",
        population: 3800,
        latitude: 18.9102,
        longitude: 73.3283,
        rainfall_deviation_mm: -80.0,
        groundwater_level_m: 55.0,
    },
    SeedVillage {
        name: "Lonavala (Rural)",
        district: "Pune",
        population: 1500,
        latitude: 18.7516,
        longitude: 73.4039,
        rainfall_deviation_mm: -8.0,
        groundwater_level_m: 17.5,
    },
];

pub const SEED_TANKERS: [SeedTanker; 3] = [
    SeedTanker {
        license_plate: "MH-12-AB-1234",
        capacity_liters: 10_000,
        is_available: true,
        latitude: 18.5204,
        longitude: 73.8567,
    },
    SeedTanker {
        license_plate: "MH-12-XY-9876",
        capacity_liters: 15_000,
        is_available: true,
        latitude: 18.6000,
        longitude: 73.7000,
    },
    SeedTanker {
        license_plate: "MH-14-GH-5555",
        capacity_liters: 8_000,
        is_available: false,
        latitude: 18.9102,
        longitude: 73.3283,
    },
];

/// Longest observation window accepted for weather enrichment
pub const MAX_ENRICHMENT_DAYS: i64 = 3650;

/// Replace static rainfall deviations with observed archive data
pub struct WeatherEnrichment {
    pub client: WeatherClient,
    /// Length of the observation window, clamped to 1..=MAX_ENRICHMENT_DAYS
    pub days: i64,
    pub baseline_mm_per_day: f64,
    pub concurrency: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SeedReport {
    pub already_seeded: bool,
    pub villages: usize,
    pub readings: usize,
    pub tankers: usize,
}

/// Load whatever part of the reference dataset is missing
///
/// Villages are matched by name and tankers by license plate, and a village
/// only gets a reading if it has none. A run that failed partway is finished
/// by the next one; a complete dataset reports `already_seeded`.
#[instrument(skip(stores, enrichment))]
pub async fn seed_database(
    stores: &Stores,
    enrichment: Option<&WeatherEnrichment>,
) -> Result<SeedReport, DbError> {
    let mut report = SeedReport::default();

    let total = stores.villages.count_villages().await? as i64;
    let existing: HashMap<String, Village> = stores
        .villages
        .find_villages(0, total.max(1))
        .await?
        .into_iter()
        .map(|v| (v.name.clone(), v))
        .collect();

    let mut pending = Vec::new();
    for seed in &SEED_VILLAGES {
        let village = match existing.get(seed.name) {
            Some(village) => village.clone(),
            None => {
                report.villages += 1;
                stores
                    .villages
                    .insert_village(&NewVillage {
                        name: seed.name.to_string(),
                        district: seed.district.to_string(),
                        population: seed.population,
                        latitude: seed.latitude,
                        longitude: seed.longitude,
                    })
                    .await?
            }
        };

        if stores
            .readings
            .find_readings_for_village(village.id)
            .await?
            .is_empty()
        {
            pending.push((village, seed));
        }
    }

    let deviations = match enrichment {
        Some(enrichment) => {
            let villages: Vec<Village> = pending.iter().map(|(v, _)| v.clone()).collect();
            observed_deviations(&villages, enrichment).await
        }
        None => pending.iter().map(|(_, s)| s.rainfall_deviation_mm).collect(),
    };

    for ((village, seed), deviation) in pending.iter().zip(deviations) {
        stores
            .readings
            .insert_reading(&NewWaterReading {
                village_id: village.id,
                rainfall_deviation_mm: deviation,
                groundwater_level_m: seed.groundwater_level_m,
                stress_index: stress_index(deviation, seed.groundwater_level_m),
            })
            .await?;
        report.readings += 1;
    }

    let plates: HashSet<String> = stores
        .tankers
        .find_tankers()
        .await?
        .into_iter()
        .map(|t| t.license_plate)
        .collect();
    for seed in SEED_TANKERS.iter().filter(|s| !plates.contains(s.license_plate)) {
        let tanker = stores
            .tankers
            .insert_tanker(&NewTanker {
                license_plate: seed.license_plate.to_string(),
                capacity_liters: seed.capacity_liters,
                current_latitude: Some(seed.latitude),
                current_longitude: Some(seed.longitude),
            })
            .await?;
        if !seed.is_available {
            stores.tankers.claim_tanker(tanker.id).await?;
        }
        report.tankers += 1;
    }

    if report == SeedReport::default() {
        info!("Database already seeded");
        report.already_seeded = true;
    } else {
        info!(
            "Seeded {} villages, {} readings and {} tankers",
            report.villages, report.readings, report.tankers
        );
    }
    Ok(report)
}

/// Inclusive `(start, end)` dates covering `days` days and ending a week
/// before `today`, since the archive lags real time
pub fn observation_window(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    let days = days.clamp(1, MAX_ENRICHMENT_DAYS);
    let end = today - Duration::days(7);
    (end - Duration::days(days - 1), end)
}

/// Archive-based deviation per village, in input order. A failed fetch
/// falls back to zero deviation for that village.
async fn observed_deviations(villages: &[Village], enrichment: &WeatherEnrichment) -> Vec<f64> {
    let (start, end) = observation_window(Utc::now().date_naive(), enrichment.days);

    let mut results: Vec<(usize, f64)> = stream::iter(villages.iter().enumerate())
        .map(|(idx, village)| async move {
            let deviation = match enrichment
                .client
                .daily_precipitation(village.latitude, village.longitude, start, end)
                .await
            {
                Ok(series) => rainfall_deviation_mm(&series, enrichment.baseline_mm_per_day),
                Err(e) => {
                    warn!(
                        "Weather fetch failed for {}: {}, using zero deviation",
                        village.name, e
                    );
                    0.0
                }
            };
            (idx, deviation)
        })
        .buffer_unordered(enrichment.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, deviation)| deviation).collect()
}
