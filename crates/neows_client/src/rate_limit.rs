//! Request quota for the NeoWs API key.
//!
//! api.nasa.gov allows 1000 requests/hour per registered key.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Hourly request limiter shared by all clones of a client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Quota of `requests` per hour, bursting up to the full quota.
    pub fn per_hour(requests: u32) -> Self {
        let quota = Quota::per_hour(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_hour(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const PROMPT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_burst_then_waits() {
        let limiter = RateLimiter::per_hour(2);
        assert!(timeout(PROMPT, limiter.wait()).await.is_ok());
        assert!(timeout(PROMPT, limiter.wait()).await.is_ok());
        assert!(timeout(PROMPT, limiter.wait()).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_quota_still_allows_one() {
        let limiter = RateLimiter::per_hour(0);
        assert!(timeout(PROMPT, limiter.wait()).await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_the_quota() {
        let limiter = RateLimiter::per_hour(1);
        let other = limiter.clone();
        assert!(timeout(PROMPT, limiter.wait()).await.is_ok());
        assert!(timeout(PROMPT, other.wait()).await.is_err());
    }
}
