use crate::db::DbError;

/// Error types for village, reading and tanker operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Village not found: {0}")]
    VillageNotFound(i64),

    #[error("Tanker not found: {0}")]
    TankerNotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Reject out-of-range or non-finite coordinates
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ServiceError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ServiceError::Validation(format!(
            "latitude must be within [-90, 90], got {}",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ServiceError::Validation(format!(
            "longitude must be within [-180, 180], got {}",
            longitude
        )));
    }
    Ok(())
}
