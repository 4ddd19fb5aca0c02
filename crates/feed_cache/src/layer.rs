//! TTL cache over a [`CacheStore`], with per-key single-flight refresh.
//!
//! A fresh entry (`now - stored_at < ttl`) is returned without calling the
//! refresh function. Stale or missing entries are refreshed under a per-key
//! async mutex; callers that queued behind an in-flight refresh re-check the
//! store and reuse its result. A failed refresh leaves the stale entry in
//! place and returns the error, unless stale fallback was enabled.

use common::config::CacheConfig;
use common::Error;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::store::{CacheEntry, CacheStore};

/// Point-in-time counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from a fresh entry.
    pub hits: u64,
    /// Entry missing or stale on arrival.
    pub misses: u64,
    /// Refresh function invoked.
    pub refreshes: u64,
    /// Refresh function failed.
    pub refresh_failures: u64,
    /// Stale payload returned after a failed refresh.
    pub stale_served: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
    stale_served: AtomicU64,
}

/// Cache of logical views keyed by name.
pub struct ViewCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    serve_stale_on_error: bool,
    /// Refresh locks for keys with a refresh in progress or queued.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    counters: Counters,
}

impl ViewCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            serve_stale_on_error: false,
            in_flight: DashMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn from_config(
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        config: &CacheConfig,
    ) -> Self {
        Self::new(store, clock, Duration::from_secs(config.ttl_secs))
            .with_stale_fallback(config.serve_stale_on_error)
    }

    /// Return the stale payload instead of the error when a refresh fails.
    pub fn with_stale_fallback(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    /// Fresh when `0 <= now - stored_at < ttl`. An entry stamped in the
    /// future (clock stepped back, copied cache dir) is stale.
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let age = self
            .clock
            .now_millis()
            .saturating_sub(entry.stored_at_epoch_millis);
        (0..ttl_ms).contains(&age)
    }

    /// Return the cached payload for `key`, calling `refresh` only when the
    /// entry is missing or stale.
    pub async fn get_or_refresh<F, Fut>(&self, key: &str, refresh: F) -> Result<Value, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Error>>,
    {
        if let Some(entry) = self.store.get(key).await? {
            if self.is_fresh(&entry) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {}", key);
                return Ok(entry.payload);
            }
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        // Drop order matters: guard, then our Arc, then the slot's cleanup.
        let slot = InFlightSlot {
            map: &self.in_flight,
            key,
        };
        let lock = slot.lock();
        let _guard = lock.lock().await;
        self.refresh_locked(key, refresh).await
    }

    /// Typed wrapper over [`get_or_refresh`](Self::get_or_refresh).
    pub async fn get_or_refresh_as<T, F, Fut>(&self, key: &str, refresh: F) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let value = self
            .get_or_refresh(key, || async move {
                let fresh = refresh().await?;
                Ok(serde_json::to_value(fresh)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            refreshes: self.counters.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.counters.refresh_failures.load(Ordering::Relaxed),
            stale_served: self.counters.stale_served.load(Ordering::Relaxed),
        }
    }

    /// Caller holds the key's refresh lock.
    async fn refresh_locked<F, Fut>(&self, key: &str, refresh: F) -> Result<Value, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Error>>,
    {
        // A refresh that finished while we queued counts as a hit.
        let existing = self.store.get(key).await?;
        if let Some(entry) = &existing {
            if self.is_fresh(entry) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {} after waiting on in-flight refresh", key);
                return Ok(entry.payload.clone());
            }
        }

        self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
        match refresh().await {
            Ok(payload) => {
                let stored_at = self.clock.now_millis();
                self.store
                    .put(CacheEntry {
                        key: key.to_string(),
                        payload: payload.clone(),
                        stored_at_epoch_millis: stored_at,
                    })
                    .await?;
                info!("Cache refreshed {}", key);
                Ok(payload)
            }
            Err(e) => {
                self.counters.refresh_failures.fetch_add(1, Ordering::Relaxed);
                match existing {
                    Some(entry) if self.serve_stale_on_error => {
                        self.counters.stale_served.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            "Refresh of {} failed, serving entry stored at {}: {}",
                            key, entry.stored_at_epoch_millis, e
                        );
                        Ok(entry.payload)
                    }
                    _ => {
                        warn!("Refresh of {} failed: {}", key, e);
                        Err(e)
                    }
                }
            }
        }
    }
}

/// Cleans up a key's refresh lock on every exit path, including when the
/// caller's future is dropped mid-refresh.
struct InFlightSlot<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
}

impl InFlightSlot<'_> {
    fn lock(&self) -> Arc<Mutex<()>> {
        self.map
            .entry(self.key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.map
            .remove_if(self.key, |_, l| Arc::strong_count(l) == 1);
    }
}
