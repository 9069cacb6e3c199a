#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Weather archive returned status {0}")]
    Status(u16),
    #[error("Failed to parse weather response: {0}")]
    ParseError(String),
    #[error("Weather response has mismatched date and precipitation series")]
    SeriesMismatch,
}

impl FetchError {
    /// Network failures and 5xx/429 responses are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::ParseError(_) | FetchError::SeriesMismatch => false,
        }
    }
}
