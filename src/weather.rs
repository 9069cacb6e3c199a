use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::fetch_error::FetchError;
use crate::scoring::round_to;

pub const DEFAULT_WEATHER_API_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Precipitation total for one day. `None` when the archive has no value.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrecipitation {
    pub date: NaiveDate,
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<NaiveDate>,
    precipitation_sum: Vec<Option<f64>>,
}

/// Client for the Open-Meteo historical weather archive
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    url: String,
}

impl WeatherClient {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            url,
        }
    }

    /// Daily precipitation series for a location and inclusive date range
    ///
    /// Transient failures are retried with exponential backoff.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn daily_precipitation(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrecipitation>, FetchError> {
        let fetch = || async { self.fetch_once(latitude, longitude, start, end).await };

        fetch
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(FetchError::is_transient)
            .notify(|e, delay| warn!("Weather fetch failed ({}), retrying in {:?}", e, delay))
            .await
    }

    async fn fetch_once(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrecipitation>, FetchError> {
        debug!("Sending HTTP request to weather archive");
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
                ("daily", "precipitation_sum".to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await?;
        debug!("Received HTTP response with status: {}", response.status());

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_archive_response(&body)
    }
}

fn parse_archive_response(body: &str) -> Result<Vec<DailyPrecipitation>, FetchError> {
    let parsed: ArchiveResponse =
        serde_json::from_str(body).map_err(|e| FetchError::ParseError(e.to_string()))?;

    let DailySeries {
        time,
        precipitation_sum,
    } = parsed.daily;
    if time.len() != precipitation_sum.len() {
        return Err(FetchError::SeriesMismatch);
    }

    Ok(time
        .into_iter()
        .zip(precipitation_sum)
        .map(|(date, precipitation_mm)| DailyPrecipitation {
            date,
            precipitation_mm,
        })
        .collect())
}

/// Observed rainfall minus the baseline expectation over the same days
///
/// Days without a value are left out of both sides. Negative is a deficit.
pub fn rainfall_deviation_mm(series: &[DailyPrecipitation], baseline_mm_per_day: f64) -> f64 {
    let observed: Vec<f64> = series.iter().filter_map(|d| d.precipitation_mm).collect();
    let total: f64 = observed.iter().sum();
    round_to(total - baseline_mm_per_day * observed.len() as f64, 2)
}
