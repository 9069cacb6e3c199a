use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drought_tanker_service::app::Application;
use drought_tanker_service::config::Config;
use drought_tanker_service::db::Stores;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,drought_tanker_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!("Starting drought tanker service with config: {:?}", config);

    let stores = match &config.database_url {
        Some(url) => Stores::connect(url, config.database_max_connections).await?,
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            Stores::in_memory()
        }
    };

    let app = Application::build(config, stores).await?;
    app.run_until_stopped().await
}
