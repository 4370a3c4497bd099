//! Error types for the harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Browser engine not found. Install with: npx playwright install")]
    EngineNotFound,

    #[error("Browser engine error: {0}")]
    Engine(String),

    #[error("Navigation to {url} did not complete within {timeout_ms}ms")]
    Navigation { url: String, timeout_ms: u64 },

    #[error("Site failed to start: {0}")]
    SiteStartup(String),

    #[error("Site health check failed after {0} attempts")]
    SiteHealthCheck(usize),

    #[error("Case spec error: {0}")]
    Spec(String),

    #[error(transparent)]
    Core(#[from] snapcheck_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl HarnessError {
    /// Only navigation timeouts are eligible for bounded retry; a failed
    /// comparison must never be retried away.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HarnessError::Navigation { .. })
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
