use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::db::DbError;
use crate::services::{DispatchError, ServiceError};

/// Body returned with every non-2xx response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuplicateLicensePlate(plate) => {
                ApiError::Conflict(format!("License plate already registered: {}", plate))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::VillageNotFound(_) | ServiceError::TankerNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            ServiceError::Validation(msg) => ApiError::Validation(msg),
            ServiceError::Database(db) => db.into(),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::VillageNotFound(_) | DispatchError::NoTankerInRange { .. } => {
                ApiError::NotFound(e.to_string())
            }
            DispatchError::ConcurrentDispatchConflict { .. } => ApiError::Conflict(e.to_string()),
            DispatchError::Database(db) => db.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
        });
        (status, body).into_response()
    }
}
