//! Retrying NeoWs client.

use common::{AppConfig, AsteroidRecord, DateWindow, Error, ProviderError, SentryObject};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::endpoint::{normalize_designation, Endpoint, Service};
use crate::normalize::normalize;
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::sentry::parse_sentry;
use crate::transport::{HttpTransport, Transport};

/// Body of a successful provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub body: Value,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// NeoWs (and JPL Sentry) client. Stateless apart from the shared rate
/// limiter; no caching.
#[derive(Clone)]
pub struct NeoWsClient {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    base_url: String,
    sentry_url: String,
    api_key: String,
    page_size: u32,
}

impl NeoWsClient {
    /// Client over HTTP with real backoff sleeps.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_transport(
            config,
            Arc::new(HttpTransport::new(&config.provider)),
            Arc::new(TokioSleeper),
        )
    }

    /// Client over an arbitrary transport and sleeper.
    pub fn with_transport(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            transport,
            sleeper,
            limiter: RateLimiter::per_hour(config.provider.requests_per_hour),
            retry: RetryPolicy::from(&config.retry),
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            sentry_url: config.provider.sentry_url.trim().to_string(),
            api_key: config.api_key.clone(),
            page_size: config.provider.page_size,
        }
    }

    /// Fetch one endpoint, retrying transient failures.
    pub async fn fetch(&self, endpoint: &Endpoint) -> Result<RawResponse, ProviderError> {
        self.fetch_with_cancel(endpoint, &CancellationToken::new())
            .await
    }

    /// Like [`fetch`](Self::fetch), aborting promptly once `cancel` fires,
    /// whether a request or a backoff sleep is in progress.
    pub async fn fetch_with_cancel(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, ProviderError> {
        let mut query = endpoint.query();
        let url = match endpoint.service() {
            Service::NeoWs => {
                query.push(("api_key".to_string(), self.api_key.clone()));
                format!("{}{}", self.base_url, endpoint.path())
            }
            Service::Sentry => format!("{}{}", self.sentry_url, endpoint.path()),
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            if attempt > 1 {
                let delay = self.retry.delay_before(attempt);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    _ = self.sleeper.sleep(delay) => {}
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                _ = self.limiter.wait() => {}
            }

            debug!("NeoWs {} (attempt {}/{})", endpoint.label(), attempt, self.retry.max_attempts);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                r = self.transport.get_json(&url, &query) => r,
            };

            match result {
                Ok(body) => return Ok(RawResponse { body, attempts: attempt }),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    warn!(
                        "NeoWs {} attempt {} failed, retrying in {}ms: {}",
                        endpoint.label(),
                        attempt,
                        self.retry.delay_before(attempt + 1).as_millis(),
                        e
                    );
                }
                Err(e) if e.is_retryable() => {
                    warn!("NeoWs {} gave up after {} attempts: {}", endpoint.label(), attempt, e);
                    return Err(ProviderError::Exhausted {
                        attempts_made: attempt,
                        cause: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Asteroids with a close approach inside `window`, in date order.
    pub async fn feed(&self, window: DateWindow) -> Result<Vec<AsteroidRecord>, Error> {
        self.fetch_records(&Endpoint::feed(window)).await
    }

    /// One page of the full NEO catalogue.
    pub async fn browse(&self, page: u32) -> Result<Vec<AsteroidRecord>, Error> {
        self.fetch_records(&Endpoint::browse(page, self.page_size)?)
            .await
    }

    /// A single asteroid by SPK-ID.
    pub async fn lookup(&self, id: &str) -> Result<AsteroidRecord, Error> {
        let records = self.fetch_records(&Endpoint::lookup(id)?).await?;
        records.into_iter().next().ok_or_else(|| {
            Error::from(ProviderError::MalformedResponse(format!(
                "lookup {id} returned no record"
            )))
        })
    }

    /// Sentry risk summary for `designation`.
    pub async fn sentry(&self, designation: &str) -> Result<SentryObject, Error> {
        let designation = normalize_designation(designation)?;
        let endpoint = Endpoint::Sentry {
            designation: designation.clone(),
        };
        let raw = self.fetch(&endpoint).await?;
        Ok(parse_sentry(&designation, raw.body)?)
    }

    async fn fetch_records(&self, endpoint: &Endpoint) -> Result<Vec<AsteroidRecord>, Error> {
        let raw = self.fetch(endpoint).await?;
        let records = normalize(raw.body)?;
        debug!("NeoWs {} -> {} records", endpoint.label(), records.len());
        Ok(records)
    }
}
