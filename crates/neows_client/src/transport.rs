//! HTTP transport seam.
//!
//! `NeoWsClient` talks to the provider through [`Transport`] so retry and
//! normalization logic can be exercised against scripted responses.

use async_trait::async_trait;
use common::config::ProviderConfig;
use common::ProviderError;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// A single GET returning a JSON body. One call is one attempt; no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, ProviderError>;
}

/// `reqwest`-backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("failed to build NeoWs HTTP client");

        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, ProviderError> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(500)
                .collect();
            return Err(classify_status(status, &body));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Timeout(format!("reading body from {url}: {e}")))?;

        debug!("NeoWs {} returned {} bytes", url, bytes.len());

        serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::MalformedResponse(format!("non-JSON body from {url}: {e}")))
    }
}

fn classify_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_builder() {
        return ProviderError::Rejected {
            status: 0,
            message: e.to_string(),
        };
    }
    // Timeouts, connect failures and dropped connections are all transient.
    ProviderError::Timeout(e.to_string())
}

/// Map a non-2xx status to a retryable or terminal error.
pub fn classify_status(status: u16, body: &str) -> ProviderError {
    match status {
        429 | 500..=599 => ProviderError::Unavailable {
            status,
            message: body.to_string(),
        },
        _ => ProviderError::Rejected {
            status,
            message: body.to_string(),
        },
    }
}
