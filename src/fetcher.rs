//! Single bounded HTTP GET returning a parsed JSON body.

use crate::providers::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default client marker sent as `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = concat!("find-my-ip/", env!("CARGO_PKG_VERSION"));

/// One outbound request, no retries, no caching.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, ProviderError>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose every request carries `user_agent` and is
    /// bounded by `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(default_headers)
            .build()?;

        Ok(Self { client })
    }

    /// Check that `url` answers at all. Never fails; the outcome is in the
    /// report.
    pub async fn probe(&self, url: &str) -> ConnectivityReport {
        let started = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) => ConnectivityReport {
                status: ProbeStatus::Success,
                api_url: url.to_string(),
                status_code: Some(response.status().as_u16()),
                response_time_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
                timestamp: Utc::now(),
            },
            Err(e) => ConnectivityReport {
                status: ProbeStatus::Error,
                api_url: url.to_string(),
                status_code: None,
                response_time_ms: None,
                error: Some(ProviderError::from(e).to_string()),
                timestamp: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        debug!(url = %url, "Sending request");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            ProviderError::MalformedBody(format!("Failed to parse response: {}", e))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Error,
}

/// Outcome of [`HttpFetcher::probe`].
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    pub status: ProbeStatus,
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}
