//! Query façade: cached provider views plus impact estimates, with a
//! stable error contract for callers.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use common::config::{AppConfig, FeedConfig};
use common::{
    AsteroidRecord, DateWindow, Error, ImpactEstimate, ImpactParameters, ProviderError,
    SentryObject,
};
use feed_cache::{CacheStats, CacheStore, JsonFileStore, MemoryStore, SystemClock, ViewCache};
use impact::{EnergyComparison, ImpactModel, RiskAssessment, RiskModel};
use neows_client::{normalize_designation, Endpoint, NeoWsClient};

pub fn feed_view_key(window: &DateWindow) -> String {
    format!("feed:{}..{}", window.start_date(), window.end_date())
}

pub fn browse_view_key(page: u32) -> String {
    format!("browse:{page}")
}

pub fn lookup_view_key(id: &str) -> String {
    format!("neo:{}", id.trim())
}

pub fn sentry_view_key(designation: &str) -> String {
    format!("sentry:{designation}")
}

pub struct NeoService {
    client: NeoWsClient,
    cache: ViewCache,
    model: ImpactModel,
    risk: RiskModel,
    feed: FeedConfig,
}

impl NeoService {
    /// Service over HTTP, caching in `cache.dir` when set and in memory otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn CacheStore> = match &config.cache.dir {
            Some(dir) => {
                info!("Caching views under {}", dir);
                Arc::new(JsonFileStore::new(dir))
            }
            None => Arc::new(MemoryStore::new()),
        };
        let cache = ViewCache::from_config(store, Arc::new(SystemClock), &config.cache);
        Self::with_parts(NeoWsClient::new(config), cache, config)
    }

    pub fn with_parts(client: NeoWsClient, cache: ViewCache, config: &AppConfig) -> Self {
        Self {
            client,
            cache,
            model: ImpactModel::from(&config.impact),
            risk: RiskModel::default(),
            feed: config.feed.clone(),
        }
    }

    /// Window from explicit dates, or the configured span around `today`.
    pub fn feed_window(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<DateWindow, Error> {
        match (start, end) {
            (Some(start), Some(end)) => DateWindow::parse(start, end),
            (None, None) => DateWindow::around(today, self.feed.days_before, self.feed.days_after),
            _ => Err(Error::InvalidParameter(
                "start and end dates must be given together".into(),
            )),
        }
    }

    /// Feed records for `window`, cached under `view_key`.
    pub async fn get_asteroid_feed(
        &self,
        view_key: &str,
        window: DateWindow,
    ) -> Result<Vec<AsteroidRecord>, Error> {
        self.cache
            .get_or_refresh_as(view_key, || self.client.feed(window))
            .await
    }

    pub async fn browse(&self, page: u32) -> Result<Vec<AsteroidRecord>, Error> {
        self.cache
            .get_or_refresh_as(&browse_view_key(page), || self.client.browse(page))
            .await
    }

    pub async fn get_asteroid_by_id(&self, id: &str) -> Result<AsteroidRecord, Error> {
        // Reject bad ids before they become cache keys.
        Endpoint::lookup(id)?;
        self.cache
            .get_or_refresh_as(&lookup_view_key(id), || self.client.lookup(id))
            .await
    }

    /// Sentry risk summary, cached under `sentry:{designation}`.
    pub async fn get_sentry_object(&self, designation: &str) -> Result<SentryObject, Error> {
        let designation = normalize_designation(designation)?;
        self.cache
            .get_or_refresh_as(&sentry_view_key(&designation), || {
                self.client.sentry(&designation)
            })
            .await
    }

    /// Consequence and deflection assessment for a Sentry object as of `now`.
    pub async fn assess_risk(
        &self,
        designation: &str,
        now: NaiveDateTime,
    ) -> Result<RiskAssessment, Error> {
        let object = self.get_sentry_object(designation).await?;
        Ok(impact::assess(&object, now, &self.risk))
    }

    pub fn estimate_impact(&self, params: &ImpactParameters) -> Result<ImpactEstimate, Error> {
        impact::estimate(params, &self.model)
    }

    pub fn compare_energy(&self, megatons: f64) -> EnergyComparison {
        impact::compare_energy(megatons)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

// ── Error Contract ────────────────────────────────────────────────────

/// Stable, machine-readable error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        let code = match err {
            Error::Provider(p) => match p {
                ProviderError::Timeout(_) => "PROVIDER_TIMEOUT",
                ProviderError::Unavailable { .. } => "PROVIDER_UNAVAILABLE",
                ProviderError::Rejected { .. } => "PROVIDER_REJECTED",
                ProviderError::MalformedResponse(_) => "MALFORMED_RESPONSE",
                ProviderError::Exhausted { .. } => "PROVIDER_EXHAUSTED",
                ProviderError::Cancelled => "CANCELLED",
            },
            Error::InvalidParameter(_) => "INVALID_PARAMETER",
            Error::CacheBackend(_) => "CACHE_BACKEND_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Json(_) | Error::Io(_) => "INTERNAL_ERROR",
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use feed_cache::ManualClock;
    use neows_client::{Sleeper, Transport};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Value, ProviderError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<Value, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get_json(
            &self,
            _url: &str,
            _query: &[(String, String)],
        ) -> Result<Value, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Timeout("script exhausted".into())))
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn service(transport: Arc<ScriptedTransport>) -> (NeoService, Arc<ManualClock>) {
        let config = AppConfig::default();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let client = NeoWsClient::with_transport(&config, transport, Arc::new(NoSleep));
        let cache = ViewCache::from_config(Arc::new(MemoryStore::new()), clock.clone(), &config.cache);
        (NeoService::with_parts(client, cache, &config), clock)
    }

    fn feed_body() -> Value {
        json!({
            "element_count": 2,
            "near_earth_objects": {
                "2026-10-15": [{"id": "2", "name": "B", "is_potentially_hazardous_asteroid": true}],
                "2026-10-14": [{"id": "1", "name": "A", "is_potentially_hazardous_asteroid": false}]
            }
        })
    }

    fn window() -> DateWindow {
        DateWindow::parse("2026-10-14", "2026-10-20").unwrap()
    }

    #[tokio::test]
    async fn test_feed_is_served_from_cache_within_ttl() {
        let transport = ScriptedTransport::new(vec![Ok(feed_body()), Ok(feed_body())]);
        let (svc, clock) = service(transport.clone());
        let key = feed_view_key(&window());
        assert_eq!(key, "feed:2026-10-14..2026-10-20");

        let first = svc.get_asteroid_feed(&key, window()).await.unwrap();
        let ids: Vec<_> = first.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        clock.advance(Duration::from_secs(60));
        let second = svc.get_asteroid_feed(&key, window()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);

        clock.advance(Duration::from_secs(15 * 60));
        svc.get_asteroid_feed(&key, window()).await.unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(svc.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_lookup_rejects_bad_id_without_calling_provider() {
        let transport = ScriptedTransport::new(vec![]);
        let (svc, _) = service(transport.clone());

        let err = svc.get_asteroid_by_id("../etc").await.unwrap_err();
        assert_eq!(ErrorResponse::from(&err).code, "INVALID_PARAMETER");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_single_record() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "id": "3542519",
            "name": "(2010 PK9)",
            "estimated_diameter": {"meters": {"estimated_diameter_min": 100.0, "estimated_diameter_max": 230.0}},
            "is_potentially_hazardous_asteroid": true
        }))]);
        let (svc, _) = service(transport.clone());

        let rec = svc.get_asteroid_by_id(" 3542519 ").await.unwrap();
        assert_eq!(rec.id, "3542519");
        assert_eq!(rec.estimated_diameter_meters, 230.0);
        assert!(rec.is_potentially_hazardous);

        svc.get_asteroid_by_id("3542519").await.unwrap();
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_map_to_stable_code() {
        let transport = ScriptedTransport::new(vec![
            Err(ProviderError::Unavailable { status: 503, message: "down".into() }),
            Err(ProviderError::Unavailable { status: 503, message: "down".into() }),
            Err(ProviderError::Unavailable { status: 503, message: "down".into() }),
        ]);
        let (svc, _) = service(transport.clone());

        let err = svc.browse(0).await.unwrap_err();
        assert_eq!(ErrorResponse::from(&err).code, "PROVIDER_EXHAUSTED");
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_error_codes() {
        let cases: Vec<(Error, &str)> = vec![
            (ProviderError::Timeout("t".into()).into(), "PROVIDER_TIMEOUT"),
            (
                ProviderError::Rejected { status: 403, message: "key".into() }.into(),
                "PROVIDER_REJECTED",
            ),
            (ProviderError::MalformedResponse("x".into()).into(), "MALFORMED_RESPONSE"),
            (ProviderError::Cancelled.into(), "CANCELLED"),
            (Error::CacheBackend("disk".into()), "CACHE_BACKEND_ERROR"),
            (Error::Config("bad".into()), "CONFIG_ERROR"),
            (Error::Io(std::io::Error::other("boom")), "INTERNAL_ERROR"),
        ];
        for (err, code) in cases {
            let resp = ErrorResponse::from(&err);
            assert_eq!(resp.code, code);
            assert_eq!(resp.message, err.to_string());
        }
    }

    #[test]
    fn test_feed_window_defaults_and_pairing() {
        let (svc, _) = service(ScriptedTransport::new(vec![]));
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();

        let w = svc.feed_window(None, None, today).unwrap();
        assert_eq!(w.start_date(), "2026-10-14");
        assert_eq!(w.end_date(), "2026-10-20");

        let err = svc.feed_window(Some("2026-10-14"), None, today).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_estimate_uses_configured_model() {
        let (svc, _) = service(ScriptedTransport::new(vec![]));
        let params = ImpactParameters::new(150.0, 20.0);
        assert_eq!(
            svc.estimate_impact(&params).unwrap(),
            impact::estimate_default(&params).unwrap()
        );
        assert_eq!(svc.compare_energy(0.0).facts, vec!["Negligible energy.".to_string()]);
    }

    #[tokio::test]
    async fn test_risk_assessment_is_cached_per_designation() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "summary": {"fullname": "(2000 SG344)", "energy": "2.6", "diameter": "0.037", "v_inf": "1.36", "ip": "2.7e-03"},
            "data": [{"date": "2071-09-16.04", "ip": "9.0e-04"}]
        }))]);
        let (svc, _) = service(transport.clone());
        let now = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let a = svc.assess_risk("2000  SG344", now).await.unwrap();
        assert_eq!(a.designation, "2000 SG344");
        assert_eq!(a.eta.as_deref(), Some("2071-09-16.04"));
        assert_eq!(a.mitigation.outcome, impact::MitigationOutcome::Feasible);

        let b = svc.assess_risk("2000 SG344", now).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(transport.calls(), 1);
        assert_eq!(svc.cache_stats().misses, 1);
    }

    #[tokio::test]
    async fn test_unknown_sentry_object_is_rejected() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"error": "specified object not found"}))]);
        let (svc, _) = service(transport.clone());
        let now = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let err = svc.assess_risk("1999XX1", now).await.unwrap_err();
        assert_eq!(ErrorResponse::from(&err).code, "PROVIDER_REJECTED");
        assert_eq!(transport.calls(), 1);

        let err = svc.assess_risk("bad;des", now).await.unwrap_err();
        assert_eq!(ErrorResponse::from(&err).code, "INVALID_PARAMETER");
        assert_eq!(transport.calls(), 1);
    }
}
