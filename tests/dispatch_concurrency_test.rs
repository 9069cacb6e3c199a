// Concurrent dispatch tests: a tanker must never be handed to two callers

use std::collections::HashSet;
use std::sync::Arc;

use drought_tanker_service::db::{NewTanker, NewVillage, Stores};
use drought_tanker_service::services::dispatch_service::DEFAULT_RADIUS_KM;
use drought_tanker_service::services::{DispatchError, DispatchService};

async fn setup(tanker_positions: &[(f64, f64)]) -> (Stores, DispatchService, Vec<i64>) {
    let stores = Stores::in_memory();
    let mut village_ids = Vec::new();
    for name in ["Rampur", "Shivapur"] {
        let village = stores
            .villages
            .insert_village(&NewVillage {
                name: name.to_string(),
                district: "Pune".to_string(),
                population: 4500,
                latitude: 18.52,
                longitude: 73.86,
            })
            .await
            .unwrap();
        village_ids.push(village.id);
    }

    for (i, (lat, lon)) in tanker_positions.iter().enumerate() {
        stores
            .tankers
            .insert_tanker(&NewTanker {
                license_plate: format!("MH-12-CC-{:04}", i),
                capacity_liters: 10_000,
                current_latitude: Some(*lat),
                current_longitude: Some(*lon),
            })
            .await
            .unwrap();
    }

    let service = DispatchService::new(stores.villages.clone(), stores.tankers.clone());
    (stores, service, village_ids)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_tanker_goes_to_exactly_one_caller() {
    let (stores, service, villages) = setup(&[(18.565, 73.86)]).await;
    let service = Arc::new(service);

    let a = {
        let service = service.clone();
        let village = villages[0];
        tokio::spawn(async move { service.dispatch(village, DEFAULT_RADIUS_KM).await })
    };
    let b = {
        let service = service.clone();
        let village = villages[1];
        tokio::spawn(async move { service.dispatch(village, DEFAULT_RADIUS_KM).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "{:?}", results);

    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(
                    e,
                    DispatchError::NoTankerInRange { .. }
                        | DispatchError::ConcurrentDispatchConflict { .. }
                ),
                "unexpected error {:?}",
                e
            );
        }
    }

    assert!(stores.tankers.find_eligible().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_never_share_a_tanker() {
    let positions: Vec<(f64, f64)> = (0..5).map(|i| (18.53 + i as f64 * 0.01, 73.86)).collect();
    let (stores, service, villages) = setup(&positions).await;
    let service = Arc::new(service);

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let service = service.clone();
            let village = villages[i % villages.len()];
            tokio::spawn(async move { service.dispatch(village, DEFAULT_RADIUS_KM).await })
        })
        .collect();

    let mut plates = HashSet::new();
    let mut successes = 0;
    for handle in handles {
        if let Ok(outcome) = handle.await.unwrap() {
            successes += 1;
            assert!(
                plates.insert(outcome.tanker_license.clone()),
                "tanker {} dispatched twice",
                outcome.tanker_license
            );
        }
    }

    assert_eq!(successes, 5);
    assert!(stores.tankers.find_eligible().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sequential_dispatch_falls_back_to_next_nearest() {
    let (stores, service, villages) = setup(&[(18.97, 73.86), (18.565, 73.86)]).await;

    let first = service.dispatch(villages[0], DEFAULT_RADIUS_KM).await.unwrap();
    assert_eq!(first.tanker_license, "MH-12-CC-0001");
    assert_eq!(first.distance_km, 5.0);

    let second = service.dispatch(villages[0], DEFAULT_RADIUS_KM).await.unwrap();
    assert_eq!(second.tanker_license, "MH-12-CC-0000");
    assert_eq!(second.distance_km, 50.0);

    let third = service.dispatch(villages[0], DEFAULT_RADIUS_KM).await;
    assert!(matches!(
        third,
        Err(DispatchError::NoTankerInRange { ref village_name, radius_km })
            if village_name == "Rampur" && radius_km == DEFAULT_RADIUS_KM
    ));

    let tankers = stores.tankers.find_tankers().await.unwrap();
    assert!(tankers.iter().all(|t| !t.is_available));
}
