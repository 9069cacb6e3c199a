// API integration tests that exercise the Axum router end to end
// against the in-memory store

mod common;

use axum::http::StatusCode;
use common::{send, test_app};
use serde_json::{json, Value};

async fn create_village(app: &axum::Router, name: &str, population: i64, lat: f64, lon: f64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/villages",
        Some(json!({
            "name": name,
            "district": "Pune",
            "population": population,
            "latitude": lat,
            "longitude": lon
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

async fn add_reading(app: &axum::Router, village_id: i64, rain: f64, groundwater: f64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/water-data",
        Some(json!({
            "village_id": village_id,
            "rainfall_deviation_mm": rain,
            "groundwater_level_m": groundwater
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn create_tanker(app: &axum::Router, plate: &str, position: Option<(f64, f64)>) -> i64 {
    let mut payload = json!({ "license_plate": plate, "capacity_liters": 10000 });
    if let Some((lat, lon)) = position {
        payload["current_latitude"] = json!(lat);
        payload["current_longitude"] = json!(lon);
    }
    let (status, body) = send(app, "POST", "/api/v1/tankers", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _stores) = test_app();

    let (status, json) = send(&app, "GET", "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_water_data_scores_reading() {
    let (app, _stores) = test_app();
    let village_id = create_village(&app, "Rampur", 4500, 18.5204, 73.8567).await;

    let reading = add_reading(&app, village_id, -80.0, 55.0).await;
    assert_eq!(reading["stress_index"], 9.5);
    assert_eq!(reading["village_id"], village_id);
    assert!(reading["predicted_stress_index"].is_null());

    let reading = add_reading(&app, village_id, 10.0, 5.0).await;
    assert_eq!(reading["stress_index"], 0.5);

    let (status, history) = send(
        &app,
        "GET",
        &format!("/api/v1/villages/{}/water-data", village_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_water_data_unknown_village() {
    let (app, _stores) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/water-data",
        Some(json!({
            "village_id": 404,
            "rainfall_deviation_mm": -10.0,
            "groundwater_level_m": 3.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Village not found: 404");
}

#[tokio::test]
async fn test_create_village_validation() {
    let (app, _stores) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/villages",
        Some(json!({
            "name": "Nowhere",
            "district": "Pune",
            "population": 100,
            "latitude": 95.0,
            "longitude": 73.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("latitude"));
}

#[tokio::test]
async fn test_list_villages_paginated() {
    let (app, _stores) = test_app();
    for i in 0..3 {
        create_village(&app, &format!("Village {}", i), 1000, 18.5, 73.8).await;
    }

    let (status, body) = send(&app, "GET", "/api/v1/villages?page=1&page_size=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_villages"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["has_next_page"], true);
    assert_eq!(body["villages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_crisis_dashboard_ranks_by_priority() {
    let (app, _stores) = test_app();
    let small = create_village(&app, "Karjat", 3800, 18.9102, 73.3283).await;
    let large = create_village(&app, "Big Town", 200_000, 18.6, 73.7).await;
    let calm = create_village(&app, "Khalapur", 6200, 18.8267, 73.2844).await;

    add_reading(&app, small, -80.0, 55.0).await; // 9.5
    add_reading(&app, large, -40.0, 50.0).await; // 7.0 * 3 = 21.0
    add_reading(&app, calm, 5.0, 12.0).await; // 1.2

    let (status, body) = send(&app, "GET", "/api/v1/crisis-dashboard", None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["village_name"], "Big Town");
    assert_eq!(entries[0]["priority_score"], 21.0);
    assert_eq!(entries[0]["location"]["lat"], 18.6);
    assert_eq!(entries[1]["village_name"], "Karjat");
    assert_eq!(entries[1]["stress_index"], 9.5);

    let (_, body) = send(&app, "GET", "/api/v1/crisis-dashboard?threshold=0", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/api/v1/crisis-dashboard?threshold=9.6", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_tanker_plate_conflicts() {
    let (app, _stores) = test_app();
    create_tanker(&app, "MH-12-AB-1234", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tankers",
        Some(json!({ "license_plate": "MH-12-AB-1234", "capacity_liters": 8000 })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_dispatch_picks_nearest_and_flips_only_it() {
    let (app, _stores) = test_app();
    let village = create_village(&app, "Rampur", 4500, 18.52, 73.86).await;
    let far = create_tanker(&app, "MH-12-FAR-0050", Some((18.97, 73.86))).await;
    let near = create_tanker(&app, "MH-12-NEAR-0005", Some((18.565, 73.86))).await;

    let (status, body) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["tanker_license"], "MH-12-NEAR-0005");
    assert_eq!(body["distance_km"], 5.0);
    assert_eq!(
        body["message"],
        "Nearest tanker MH-12-NEAR-0005 dispatched from 5 km away!"
    );

    let (_, tankers) = send(&app, "GET", "/api/v1/tankers", None).await;
    for tanker in tankers.as_array().unwrap() {
        let id = tanker["id"].as_i64().unwrap();
        if id == near {
            assert_eq!(tanker["is_available"], false);
        } else if id == far {
            assert_eq!(tanker["is_available"], true);
        }
    }
}

#[tokio::test]
async fn test_dispatch_unpositioned_tanker_is_not_in_range() {
    let (app, _stores) = test_app();
    let village = create_village(&app, "Shivapur", 2100, 18.3323, 73.8687).await;
    create_tanker(&app, "MH-12-NOGPS-0001", None).await;

    let (status, body) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "No tankers available within 500 km of Shivapur! Consider requesting inter-district support."
    );
}

#[tokio::test]
async fn test_dispatch_respects_radius_query() {
    let (app, _stores) = test_app();
    let village = create_village(&app, "Rampur", 4500, 18.52, 73.86).await;
    create_tanker(&app, "MH-12-FAR-0050", Some((18.97, 73.86))).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/dispatch/{}?radius_km=10", village),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("within 10 km"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/dispatch/{}?radius_km=-1", village),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/dispatch/{}?radius_km=60", village),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tanker_license"], "MH-12-FAR-0050");
}

#[tokio::test]
async fn test_dispatch_unknown_village() {
    let (app, _stores) = test_app();

    let (status, body) = send(&app, "POST", "/api/v1/dispatch/77", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Village not found: 77");
}

#[tokio::test]
async fn test_release_and_position_make_tanker_eligible() {
    let (app, _stores) = test_app();
    let village = create_village(&app, "Karjat", 3800, 18.9102, 73.3283).await;
    let tanker = create_tanker(&app, "MH-14-GH-5555", None).await;

    let (status, _) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/tankers/{}/position", tanker),
        Some(json!({ "latitude": 18.9, "longitude": 73.33 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_latitude"], 18.9);

    let (status, _) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;
    assert_eq!(status, StatusCode::OK);

    // Dispatched tanker is out of the pool until released
    let (status, _) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tankers/{}/release", tanker),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_available"], true);

    let (status, _) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_release_unknown_tanker() {
    let (app, _stores) = test_app();

    let (status, body) = send(&app, "POST", "/api/v1/tankers/5/release", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Tanker not found: 5");
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let (app, _stores) = test_app();
    let village = create_village(&app, "Rampur", 4500, 18.52, 73.86).await;

    let bad_requests = [
        (
            "POST",
            "/api/v1/villages".to_string(),
            Some(json!({
                "name": "Karjat",
                "district": "Raigad",
                "population": 3e9,
                "latitude": 18.91,
                "longitude": 73.33
            })),
        ),
        ("POST", "/api/v1/villages".to_string(), None),
        (
            "POST",
            format!("/api/v1/dispatch/{}?radius_km=abc", village),
            None,
        ),
        ("POST", "/api/v1/dispatch/abc".to_string(), None),
        ("GET", "/api/v1/crisis-dashboard?threshold=high".to_string(), None),
        ("GET", "/api/v1/tankers?available=maybe".to_string(), None),
    ];

    for (method, uri, body) in bad_requests {
        let (status, body) = send(&app, method, &uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(body["success"], false, "{} {}", method, uri);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    // Nothing was dispatched or created by the rejected requests
    let (_, villages) = send(&app, "GET", "/api/v1/villages", None).await;
    assert_eq!(villages["total_villages"], 1);
}

#[tokio::test]
async fn test_list_tankers_available_filter() {
    let (app, _stores) = test_app();
    let village = create_village(&app, "Rampur", 4500, 18.52, 73.86).await;
    create_tanker(&app, "MH-12-AB-1234", Some((18.565, 73.86))).await;
    create_tanker(&app, "MH-12-XY-9876", None).await;

    let (status, _) = send(&app, "POST", &format!("/api/v1/dispatch/{}", village), None).await;
    assert_eq!(status, StatusCode::OK);

    let plates = |body: Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|t| t["license_plate"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, available) = send(&app, "GET", "/api/v1/tankers?available=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plates(available), vec!["MH-12-XY-9876"]);

    let (_, busy) = send(&app, "GET", "/api/v1/tankers?available=false", None).await;
    assert_eq!(plates(busy), vec!["MH-12-AB-1234"]);

    let (_, all) = send(&app, "GET", "/api/v1/tankers", None).await;
    assert_eq!(plates(all).len(), 2);
}

#[test]
fn test_openapi_lists_routes() {
    let spec = drought_tanker_service::api::generate_openapi_spec();
    let json = serde_json::to_value(&spec).unwrap();
    let paths = json["paths"].as_object().unwrap();

    assert!(paths.contains_key("/api/v1/dispatch/{village_id}"));
    assert!(paths.contains_key("/api/v1/crisis-dashboard"));
    assert!(paths.contains_key("/api/v1/tankers/{id}/release"));
}
