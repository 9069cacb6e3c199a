use std::env;

use crate::services::dispatch_service::DEFAULT_RADIUS_KM;
use crate::services::triage_service::DEFAULT_THRESHOLD;

#[derive(Debug, Clone)]
pub struct Config {
    /// In-memory storage is used when unset
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    pub dispatch_radius_km: f64,
    pub triage_threshold: f64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            dispatch_radius_km: env::var("DISPATCH_RADIUS_KM")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|r: &f64| r.is_finite() && *r >= 0.0)
                .unwrap_or(DEFAULT_RADIUS_KM),
            triage_threshold: env::var("TRIAGE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|t: &f64| t.is_finite())
                .unwrap_or(DEFAULT_THRESHOLD),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| {
                    "http://localhost,http://localhost:3000,http://localhost:5173".to_string()
                }),
            ),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
