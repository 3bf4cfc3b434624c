use std::time::Duration;

const DEV_BASE_URL: &str = "http://localhost:5000/api";
const PROD_BASE_URL: &str = "https://foodscan-backend.onrender.com/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
// Image prediction runs a CNN on the backend and is noticeably slower.
const PREDICT_TIMEOUT_SECS: u64 = 60;

/// Transport configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub predict_timeout: Duration,
}

impl ApiConfig {
    pub fn development() -> Self {
        Self::with_base_url(DEV_BASE_URL)
    }

    pub fn production() -> Self {
        Self::with_base_url(PROD_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            predict_timeout: Duration::from_secs(PREDICT_TIMEOUT_SECS),
        }
    }

    /// Resolve the configuration from the environment.
    ///
    /// `FOODSCAN_API_URL` overrides the base URL directly; otherwise
    /// `FOODSCAN_ENV=production` selects the production endpoint and anything
    /// else falls back to the development one.
    pub fn from_env() -> Self {
        if let Ok(url) = std::env::var("FOODSCAN_API_URL") {
            return Self::with_base_url(url);
        }
        let is_production = std::env::var("FOODSCAN_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        if is_production {
            Self::production()
        } else {
            Self::development()
        }
    }
}
