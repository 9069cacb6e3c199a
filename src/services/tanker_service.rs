use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::db::{NewTanker, Tanker, TankerStore};
use crate::services::error::{validate_coordinates, ServiceError};

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PositionReport {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone)]
pub struct TankerService {
    tankers: Arc<dyn TankerStore>,
}

impl TankerService {
    pub fn new(tankers: Arc<dyn TankerStore>) -> Self {
        Self { tankers }
    }

    /// Register a tanker. New tankers start out available.
    #[instrument(skip(self, tanker), fields(license_plate = %tanker.license_plate))]
    pub async fn register_tanker(&self, tanker: &NewTanker) -> Result<Tanker, ServiceError> {
        let license_plate = tanker.license_plate.trim();
        if license_plate.is_empty() {
            return Err(ServiceError::Validation(
                "license_plate must not be empty".to_string(),
            ));
        }
        if tanker.capacity_liters < 0 {
            return Err(ServiceError::Validation(format!(
                "capacity_liters must be non-negative, got {}",
                tanker.capacity_liters
            )));
        }
        match (tanker.current_latitude, tanker.current_longitude) {
            (Some(lat), Some(lon)) => validate_coordinates(lat, lon)?,
            (None, None) => {}
            _ => {
                return Err(ServiceError::Validation(
                    "current_latitude and current_longitude must be given together".to_string(),
                ))
            }
        }

        let normalized = NewTanker {
            license_plate: license_plate.to_string(),
            ..tanker.clone()
        };
        Ok(self.tankers.insert_tanker(&normalized).await?)
    }

    /// All tankers, or only those whose availability matches `available`
    pub async fn list_tankers(
        &self,
        available: Option<bool>,
    ) -> Result<Vec<Tanker>, ServiceError> {
        let mut tankers = self.tankers.find_tankers().await?;
        if let Some(available) = available {
            tankers.retain(|t| t.is_available == available);
        }
        Ok(tankers)
    }

    #[instrument(skip(self))]
    pub async fn report_position(
        &self,
        id: i64,
        position: PositionReport,
    ) -> Result<Tanker, ServiceError> {
        validate_coordinates(position.latitude, position.longitude)?;

        self.tankers
            .update_position(id, position.latitude, position.longitude)
            .await?
            .ok_or(ServiceError::TankerNotFound(id))
    }

    /// Return a dispatched tanker to the available pool
    #[instrument(skip(self))]
    pub async fn release_tanker(&self, id: i64) -> Result<Tanker, ServiceError> {
        let tanker = self
            .tankers
            .release_tanker(id)
            .await?
            .ok_or(ServiceError::TankerNotFound(id))?;

        info!("Tanker {} returned to service", tanker.license_plate);
        Ok(tanker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, InMemoryStore};

    fn service() -> TankerService {
        TankerService::new(Arc::new(InMemoryStore::new()))
    }

    fn new_tanker(plate: &str) -> NewTanker {
        NewTanker {
            license_plate: plate.to_string(),
            capacity_liters: 10_000,
            current_latitude: None,
            current_longitude: None,
        }
    }

    #[tokio::test]
    async fn test_register_trims_plate_and_rejects_duplicates() {
        let service = service();
        let tanker = service
            .register_tanker(&new_tanker("  MH-12-AB-1234 "))
            .await
            .unwrap();
        assert_eq!(tanker.license_plate, "MH-12-AB-1234");
        assert!(tanker.is_available);

        let result = service.register_tanker(&new_tanker("MH-12-AB-1234")).await;
        assert!(matches!(
            result,
            Err(ServiceError::Database(DbError::DuplicateLicensePlate(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_requires_complete_position() {
        let service = service();
        let mut tanker = new_tanker("MH-12-XY-9876");
        tanker.current_latitude = Some(18.6);

        assert!(matches!(
            service.register_tanker(&tanker).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_report_position_and_release() {
        let service = service();
        let tanker = service
            .register_tanker(&new_tanker("MH-14-GH-5555"))
            .await
            .unwrap();

        let moved = service
            .report_position(
                tanker.id,
                PositionReport {
                    latitude: 18.9102,
                    longitude: 73.3283,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.position(), Some((18.9102, 73.3283)));

        let missing = service.release_tanker(99).await;
        assert!(matches!(missing, Err(ServiceError::TankerNotFound(99))));

        let invalid = service
            .report_position(
                tanker.id,
                PositionReport {
                    latitude: 120.0,
                    longitude: 0.0,
                },
            )
            .await;
        assert!(matches!(invalid, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_tankers_filters_on_availability() {
        let service = service();
        let busy = service
            .register_tanker(&new_tanker("MH-14-GH-5555"))
            .await
            .unwrap();
        service
            .register_tanker(&new_tanker("MH-12-AB-1234"))
            .await
            .unwrap();
        assert!(service.tankers.claim_tanker(busy.id).await.unwrap());

        let plates = |tankers: Vec<Tanker>| {
            tankers
                .into_iter()
                .map(|t| t.license_plate)
                .collect::<Vec<_>>()
        };
        assert_eq!(
            plates(service.list_tankers(Some(true)).await.unwrap()),
            vec!["MH-12-AB-1234"]
        );
        assert_eq!(
            plates(service.list_tankers(Some(false)).await.unwrap()),
            vec!["MH-14-GH-5555"]
        );
        assert_eq!(service.list_tankers(None).await.unwrap().len(), 2);
    }
}
