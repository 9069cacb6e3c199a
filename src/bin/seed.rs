use clap::Parser;
use drought_tanker_service::db::Stores;
use drought_tanker_service::seed::{seed_database, WeatherEnrichment, MAX_ENRICHMENT_DAYS};
use drought_tanker_service::weather::{WeatherClient, DEFAULT_WEATHER_API_URL};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Load the reference villages, readings and tankers", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env)]
    database_url: String,

    /// Maximum pool connections
    #[arg(long, default_value = "2")]
    max_connections: u32,

    /// Derive rainfall deviation from the weather archive instead of the built-in values
    #[arg(long)]
    enrich_weather: bool,

    /// Weather archive endpoint
    #[arg(long, env, default_value = DEFAULT_WEATHER_API_URL)]
    weather_api_url: String,

    /// Observation window in days for weather enrichment
    #[arg(
        long,
        default_value = "30",
        value_parser = clap::value_parser!(i64).range(1..=MAX_ENRICHMENT_DAYS)
    )]
    days: i64,

    /// Expected rainfall in mm per day; deviation is measured against this
    #[arg(long, default_value = "3.0")]
    baseline_mm_per_day: f64,

    /// Number of parallel weather requests
    #[arg(long, default_value = "4")]
    parallel: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let stores = Stores::connect(&cli.database_url, cli.max_connections).await?;

    let enrichment = cli.enrich_weather.then(|| WeatherEnrichment {
        client: WeatherClient::new(cli.weather_api_url.clone()),
        days: cli.days,
        baseline_mm_per_day: cli.baseline_mm_per_day,
        concurrency: cli.parallel,
    });

    let report = seed_database(&stores, enrichment.as_ref()).await;
    stores.close().await;
    let report = report?;

    if report.already_seeded {
        info!("Reference dataset already complete, nothing to do");
    } else {
        info!(
            "Seeded {} villages, {} readings, {} tankers",
            report.villages, report.readings, report.tankers
        );
    }

    Ok(())
}
