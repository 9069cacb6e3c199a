use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::db::{DbError, Tanker, TankerStore, Village, VillageStore};
use crate::geo::haversine_km;
use crate::scoring::round_to;

/// Search radius used when the caller does not give one
pub const DEFAULT_RADIUS_KM: f64 = 500.0;

/// Error types for dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Village not found: {0}")]
    VillageNotFound(i64),

    #[error("No tankers available within {radius_km:.0} km of {village_name}! Consider requesting inter-district support.")]
    NoTankerInRange { village_name: String, radius_km: f64 },

    #[error("Every tanker in range of {village_name} was claimed by another dispatch, please retry")]
    ConcurrentDispatchConflict { village_name: String },

    #[error(transparent)]
    Database(#[from] DbError),
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DispatchOutcome {
    pub village_id: i64,
    pub tanker_id: i64,
    pub tanker_license: String,
    /// Rounded to one decimal
    pub distance_km: f64,
    pub message: String,
}

/// An eligible tanker and its distance to the requesting village
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub tanker: Tanker,
    pub distance_km: f64,
}

/// Eligible tankers within `radius_km` of the village, nearest first
///
/// Tankers that are unavailable or have no reported position are skipped.
/// Equal distances are ordered by tanker id.
pub fn rank_candidates(village: &Village, tankers: &[Tanker], radius_km: f64) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = tankers
        .iter()
        .filter(|t| t.is_available)
        .filter_map(|t| {
            let (lat, lon) = t.position()?;
            let distance_km = haversine_km(village.latitude, village.longitude, lat, lon);
            (distance_km <= radius_km).then(|| Candidate {
                tanker: t.clone(),
                distance_km,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.tanker.id.cmp(&b.tanker.id))
    });
    candidates
}

#[derive(Clone)]
pub struct DispatchService {
    villages: Arc<dyn VillageStore>,
    tankers: Arc<dyn TankerStore>,
}

impl DispatchService {
    pub fn new(villages: Arc<dyn VillageStore>, tankers: Arc<dyn TankerStore>) -> Self {
        Self { villages, tankers }
    }

    /// Send the nearest eligible tanker to a village
    ///
    /// The availability flip is a compare-and-swap in the store. If a
    /// concurrent dispatch claims the chosen tanker first, the next-nearest
    /// candidate is tried. A tanker is never handed to two callers.
    #[instrument(skip(self))]
    pub async fn dispatch(
        &self,
        village_id: i64,
        radius_km: f64,
    ) -> Result<DispatchOutcome, DispatchError> {
        let village = self
            .villages
            .find_village(village_id)
            .await?
            .ok_or(DispatchError::VillageNotFound(village_id))?;

        let eligible = self.tankers.find_eligible().await?;
        let candidates = rank_candidates(&village, &eligible, radius_km);
        debug!(
            "{} of {} eligible tankers within {} km of {}",
            candidates.len(),
            eligible.len(),
            radius_km,
            village.name
        );

        if candidates.is_empty() {
            warn!("No tanker within {} km of {}", radius_km, village.name);
            return Err(DispatchError::NoTankerInRange {
                village_name: village.name,
                radius_km,
            });
        }

        for candidate in candidates {
            if !self.tankers.claim_tanker(candidate.tanker.id).await? {
                warn!(
                    "Tanker {} claimed by a concurrent dispatch, trying next candidate",
                    candidate.tanker.license_plate
                );
                continue;
            }

            let message = format!(
                "Nearest tanker {} dispatched from {:.0} km away!",
                candidate.tanker.license_plate, candidate.distance_km
            );
            info!("{} (village {})", message, village.name);

            return Ok(DispatchOutcome {
                village_id: village.id,
                tanker_id: candidate.tanker.id,
                tanker_license: candidate.tanker.license_plate,
                distance_km: round_to(candidate.distance_km, 1),
                message,
            });
        }

        Err(DispatchError::ConcurrentDispatchConflict {
            village_name: village.name,
        })
    }
}
