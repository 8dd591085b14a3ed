use std::time::Duration;

/// Public WOO X REST endpoint.
pub const WOOX_MAINNET_URL: &str = "https://api.woo.network";

/// Configuration for the WOO X client.
#[derive(Debug, Clone)]
pub struct WooxConfig {
    /// Base URL for the REST API (e.g. `https://api.woo.network`).
    pub base_url: String,
    /// Pause before every page request after the first one of a fetch.
    pub page_interval: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for WooxConfig {
    fn default() -> Self {
        Self {
            base_url: WOOX_MAINNET_URL.into(),
            page_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl WooxConfig {
    /// Config for a given base URL with no page spacing (mock servers, tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            page_interval: Duration::ZERO,
            ..Default::default()
        }
    }
}
