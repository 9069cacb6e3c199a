#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use drought_tanker_service::api::create_router;
use drought_tanker_service::app::build_state;
use drought_tanker_service::config::Config;
use drought_tanker_service::db::Stores;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        database_url: None,
        database_max_connections: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        dispatch_radius_km: 500.0,
        triage_threshold: 6.0,
        cors_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// Router over a fresh in-memory store
pub fn test_app() -> (Router, Stores) {
    let stores = Stores::in_memory();
    let router = create_router(build_state(&stores, &test_config()));
    (router, stores)
}

/// Send one request and decode the JSON body (Null when empty)
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
