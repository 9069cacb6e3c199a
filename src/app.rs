use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::db::Stores;
use crate::services::{DispatchService, TankerService, TriageService, VillageService};

/// Wire services over an opened store handle
pub fn build_state(stores: &Stores, config: &Config) -> AppState {
    AppState {
        village_service: VillageService::new(stores.villages.clone(), stores.readings.clone()),
        tanker_service: TankerService::new(stores.tankers.clone()),
        triage_service: TriageService::new(stores.readings.clone()),
        dispatch_service: DispatchService::new(stores.villages.clone(), stores.tankers.clone()),
        default_threshold: config.triage_threshold,
        default_radius_km: config.dispatch_radius_km,
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// HTTP server bound to its listener, plus the store it owns
///
/// The store is opened before `build` and closed by `run_until_stopped`
/// once the server has drained.
pub struct Application {
    listener: TcpListener,
    router: Router,
    stores: Stores,
}

impl Application {
    pub async fn build(config: Config, stores: Stores) -> Result<Self, Box<dyn std::error::Error>> {
        info!(
            "Initializing application components (storage: {})",
            if stores.is_persistent() { "postgres" } else { "in-memory" }
        );

        let state = build_state(&stores, &config);
        let router = create_router(state)
            .layer(cors_layer(&config.cors_origins))
            .layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            stores,
        })
    }

    pub fn port(&self) -> Result<u16, std::io::Error> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Serve until Ctrl-C (or SIGTERM on unix), then close the store
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped, shutting down");
        self.stores.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
