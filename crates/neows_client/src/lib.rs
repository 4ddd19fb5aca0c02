//! NASA NeoWs and JPL Sentry client.
//!
//! Fetches near-Earth-object records with bounded retries, exponential
//! backoff and an hourly request quota, then flattens the provider's
//! response shapes into `AsteroidRecord`s.

pub mod client;
pub mod endpoint;
pub mod normalize;
pub mod rate_limit;
pub mod retry;
pub mod sentry;
pub mod transport;

pub use client::{NeoWsClient, RawResponse};
pub use endpoint::{normalize_designation, Endpoint, Service};
pub use normalize::{normalize, ResponseShape, DEFAULT_DIAMETER_METERS};
pub use rate_limit::RateLimiter;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use sentry::parse_sentry;
pub use transport::{HttpTransport, Transport};
