pub mod error;
pub mod extractor;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::db::{NewTanker, NewVillage, Tanker, Village, WaterReading};
use crate::services::dispatch_service::DispatchOutcome;
use crate::services::tanker_service::PositionReport;
use crate::services::triage_service::{Location, TriageEntry};
use crate::services::village_service::{PaginationParams, VillageListResponse, WaterDataRequest};
use crate::services::{DispatchService, TankerService, TriageService, VillageService};

pub use error::{ApiError, ErrorResponse};
pub use extractor::{ApiJson, ApiPath, ApiQuery};

#[derive(Clone)]
pub struct AppState {
    pub village_service: VillageService,
    pub tanker_service: TankerService,
    pub triage_service: TriageService,
    pub dispatch_service: DispatchService,
    pub default_threshold: f64,
    pub default_radius_km: f64,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CrisisQuery {
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TankerListQuery {
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchQuery {
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchResponse {
    pub success: bool,
    pub tanker_license: String,
    pub distance_km: f64,
    pub message: String,
}

impl From<DispatchOutcome> for DispatchResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            success: true,
            tanker_license: outcome.tanker_license,
            distance_km: outcome.distance_km,
            message: outcome.message,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Drought Warning & Tanker Dispatch API",
        description = "Drought stress triage for villages and nearest-tanker dispatch"
    ),
    paths(
        health,
        create_village,
        list_villages,
        get_village_readings,
        create_water_data,
        get_crisis_dashboard,
        create_tanker,
        list_tankers,
        report_tanker_position,
        release_tanker,
        dispatch_tanker
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        Village,
        NewVillage,
        VillageListResponse,
        WaterReading,
        WaterDataRequest,
        Tanker,
        NewTanker,
        PositionReport,
        TriageEntry,
        Location,
        DispatchResponse
    ))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/villages", post(create_village).get(list_villages))
        .route("/villages/{id}/water-data", get(get_village_readings))
        .route("/water-data", post(create_water_data))
        .route("/crisis-dashboard", get(get_crisis_dashboard))
        .route("/tankers", post(create_tanker).get(list_tankers))
        .route("/tankers/{id}/position", put(report_tanker_position))
        .route("/tankers/{id}/release", post(release_tanker))
        .route("/dispatch/{village_id}", post(dispatch_tanker))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/villages",
    request_body = NewVillage,
    responses(
        (status = 201, description = "Village created", body = Village),
        (status = 400, description = "Invalid village", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(name = %body.name))]
async fn create_village(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewVillage>,
) -> Result<(StatusCode, Json<Village>), ApiError> {
    let village = state.village_service.create_village(&body).await?;
    info!("Created village {} ({})", village.id, village.name);
    Ok((StatusCode::CREATED, Json(village)))
}

#[utoipa::path(
    get,
    path = "/api/v1/villages",
    params(
        ("page" = Option<u32>, Query, description = "Page number, starting at 1"),
        ("page_size" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses((status = 200, description = "Paginated villages", body = VillageListResponse))
)]
#[instrument(skip(state))]
async fn list_villages(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<VillageListResponse>, ApiError> {
    debug!(
        "Fetching villages (page={}, page_size={})",
        params.page, params.page_size
    );
    let response = state.village_service.get_villages_paginated(&params).await?;

    info!(
        "Retrieved {} villages (page {}/{}, total={})",
        response.villages.len(),
        response.page,
        response.total_pages,
        response.total_villages
    );
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/villages/{id}/water-data",
    params(("id" = i64, Path, description = "Village id")),
    responses(
        (status = 200, description = "Readings, newest first", body = [WaterReading]),
        (status = 404, description = "Unknown village", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(village_id = %id))]
async fn get_village_readings(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<WaterReading>>, ApiError> {
    let readings = state.village_service.get_readings(id).await?;
    debug!("Retrieved {} readings for village {}", readings.len(), id);
    Ok(Json(readings))
}

#[utoipa::path(
    post,
    path = "/api/v1/water-data",
    request_body = WaterDataRequest,
    responses(
        (status = 201, description = "Reading scored and stored", body = WaterReading),
        (status = 400, description = "Non-finite reading", body = ErrorResponse),
        (status = 404, description = "Unknown village", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(village_id = body.village_id))]
async fn create_water_data(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<WaterDataRequest>,
) -> Result<(StatusCode, Json<WaterReading>), ApiError> {
    let reading = state.village_service.record_reading(&body).await?;
    info!(
        "Recorded reading for village {} with stress index {:.2}",
        reading.village_id, reading.stress_index
    );
    Ok((StatusCode::CREATED, Json(reading)))
}

#[utoipa::path(
    get,
    path = "/api/v1/crisis-dashboard",
    params(("threshold" = Option<f64>, Query, description = "Minimum stress index, default 6.0")),
    responses(
        (status = 200, description = "Readings ranked by priority score", body = [TriageEntry]),
        (status = 400, description = "Invalid threshold", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn get_crisis_dashboard(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CrisisQuery>,
) -> Result<Json<Vec<TriageEntry>>, ApiError> {
    let threshold = query.threshold.unwrap_or(state.default_threshold);
    if !threshold.is_finite() {
        return Err(ApiError::Validation(
            "threshold must be a finite number".to_string(),
        ));
    }

    let entries = state.triage_service.crisis_dashboard(threshold).await?;
    info!(
        "Crisis dashboard: {} readings at or above stress {}",
        entries.len(),
        threshold
    );
    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/api/v1/tankers",
    request_body = NewTanker,
    responses(
        (status = 201, description = "Tanker registered", body = Tanker),
        (status = 400, description = "Invalid tanker", body = ErrorResponse),
        (status = 409, description = "License plate already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(license_plate = %body.license_plate))]
async fn create_tanker(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewTanker>,
) -> Result<(StatusCode, Json<Tanker>), ApiError> {
    let tanker = state.tanker_service.register_tanker(&body).await?;
    info!("Registered tanker {} ({})", tanker.id, tanker.license_plate);
    Ok((StatusCode::CREATED, Json(tanker)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tankers",
    params(("available" = Option<bool>, Query, description = "Only tankers with this availability")),
    responses(
        (status = 200, description = "Tankers ordered by id", body = [Tanker]),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn list_tankers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TankerListQuery>,
) -> Result<Json<Vec<Tanker>>, ApiError> {
    let tankers = state.tanker_service.list_tankers(query.available).await?;
    debug!("Retrieved {} tankers", tankers.len());
    Ok(Json(tankers))
}

#[utoipa::path(
    put,
    path = "/api/v1/tankers/{id}/position",
    params(("id" = i64, Path, description = "Tanker id")),
    request_body = PositionReport,
    responses(
        (status = 200, description = "Position updated", body = Tanker),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 404, description = "Unknown tanker", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(tanker_id = %id))]
async fn report_tanker_position(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<PositionReport>,
) -> Result<Json<Tanker>, ApiError> {
    let tanker = state.tanker_service.report_position(id, body).await?;
    debug!(
        "Tanker {} now at ({}, {})",
        tanker.license_plate, body.latitude, body.longitude
    );
    Ok(Json(tanker))
}

#[utoipa::path(
    post,
    path = "/api/v1/tankers/{id}/release",
    params(("id" = i64, Path, description = "Tanker id")),
    responses(
        (status = 200, description = "Tanker available again", body = Tanker),
        (status = 404, description = "Unknown tanker", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(tanker_id = %id))]
async fn release_tanker(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Tanker>, ApiError> {
    let tanker = state.tanker_service.release_tanker(id).await?;
    Ok(Json(tanker))
}

#[utoipa::path(
    post,
    path = "/api/v1/dispatch/{village_id}",
    params(
        ("village_id" = i64, Path, description = "Requesting village"),
        ("radius_km" = Option<f64>, Query, description = "Search radius, default 500 km")
    ),
    responses(
        (status = 200, description = "Nearest tanker dispatched", body = DispatchResponse),
        (status = 400, description = "Invalid radius", body = ErrorResponse),
        (status = 404, description = "Unknown village or no tanker in range", body = ErrorResponse),
        (status = 409, description = "Lost every candidate to concurrent dispatches", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(village_id = %village_id))]
async fn dispatch_tanker(
    State(state): State<AppState>,
    ApiPath(village_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<DispatchQuery>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let radius_km = query.radius_km.unwrap_or(state.default_radius_km);
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(ApiError::Validation(
            "radius_km must be a non-negative number".to_string(),
        ));
    }

    let outcome = state
        .dispatch_service
        .dispatch(village_id, radius_km)
        .await
        .map_err(|e| {
            warn!("Dispatch for village {} failed: {}", village_id, e);
            ApiError::from(e)
        })?;

    info!(
        "Dispatched tanker {} to village {} ({} km)",
        outcome.tanker_license, village_id, outcome.distance_km
    );
    Ok(Json(outcome.into()))
}
