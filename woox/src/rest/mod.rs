pub mod endpoints;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::WooxConfig;
use crate::error::{Result, WooxError};
use crate::signing::{self, Credentials};

/// HTTP client wrapper for the WOO X REST API.
#[derive(Debug, Clone)]
pub struct WooxHttpClient {
    client: Client,
    base_url: Url,
    page_interval: Duration,
}

impl WooxHttpClient {
    /// # Errors
    ///
    /// Returns `WooxError::Url` if the base URL does not parse, or
    /// `WooxError::Request` if the HTTP client cannot be built.
    pub fn new(config: &WooxConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url,
            page_interval: config.page_interval,
        })
    }

    /// Signed GET of a JSON resource.
    ///
    /// The query string holds the sorted parameters form-urlencoded, so it
    /// decodes to exactly the values covered by the signature. A non-2xx
    /// response whose body still parses as `T` is returned as `Ok`, since the
    /// API reports rejected requests inside its JSON envelope.
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<T> {
        let mut url = self.base_url.join(path)?;
        let query = signing::query_string(params.iter().map(|(k, v)| (*k, v.as_str())));
        url.set_query(if query.is_empty() { None } else { Some(&query) });

        let headers = signing::auth_headers(credentials, params);
        let mut request = self.client.get(url);
        for (name, value) in headers.to_pairs() {
            request = request.header(name, value);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        match serde_json::from_str::<T>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) if status.is_success() => Err(WooxError::MalformedResponse(e.to_string())),
            Err(_) => Err(WooxError::Http {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    /// Pause applied before each page request after the first.
    pub fn page_interval(&self) -> Duration {
        self.page_interval
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }
}
