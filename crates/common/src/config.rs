//! Service configuration types.

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// NASA API key, sent as the `api_key` query parameter.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// NeoWs endpoint settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retry/backoff policy for provider calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// View cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Default feed window.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Scaling constants for impact estimates.
    #[serde(default)]
    pub impact: ImpactConfig,
}

/// NeoWs provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// JPL Sentry risk-table endpoint (no API key).
    #[serde(default = "default_sentry_url")]
    pub sentry_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-attempt request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Page size for browse requests.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hourly request quota for the API key.
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u32,
}

/// Retry policy (milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// View cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Freshness window in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Persist entries as JSON files under this directory. In-memory when unset.
    #[serde(default)]
    pub dir: Option<String>,

    /// Return the stale payload when a refresh fails instead of the error.
    #[serde(default)]
    pub serve_stale_on_error: bool,
}

/// Default feed window around today (days).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_days_around")]
    pub days_before: u32,

    #[serde(default = "default_days_around")]
    pub days_after: u32,
}

/// Impact model constants. Heuristics, not validated physics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Impactor density used when a request carries none.
    #[serde(default = "default_impactor_density")]
    pub default_density_kg_per_m3: f64,

    /// Target rock density for crater scaling.
    #[serde(default = "default_target_density")]
    pub target_density_kg_per_m3: f64,

    /// Blast radius (km) per cube-root kiloton.
    #[serde(default = "default_blast_scaling")]
    pub blast_scaling_km: f64,

    #[serde(default = "default_crater_coefficient")]
    pub crater_coefficient: f64,

    #[serde(default = "default_min_crater")]
    pub min_crater_diameter_m: f64,

    /// Source wave height (m) per cube-root joule.
    #[serde(default = "default_tsunami_alpha")]
    pub tsunami_alpha: f64,

    /// Distance (km) over which the wave halves.
    #[serde(default = "default_tsunami_attenuation")]
    pub tsunami_attenuation_km: f64,

    #[serde(default = "default_min_wave")]
    pub min_wave_height_m: f64,

    /// Uniform population density in the affected area (people/km²).
    #[serde(default = "default_population_density")]
    pub population_density_per_km2: f64,

    /// Fraction of the affected population counted as casualties.
    #[serde(default = "default_mortality_fraction")]
    pub mortality_fraction: f64,

    #[serde(default = "default_cost_per_km2")]
    pub cost_per_km2_usd: f64,

    #[serde(default = "default_cost_per_kiloton")]
    pub cost_per_kiloton_usd: f64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_api_key() -> String {
    "DEMO_KEY".into()
}

fn default_base_url() -> String {
    "https://api.nasa.gov/neo/rest/v1".into()
}
fn default_sentry_url() -> String {
    "https://ssd-api.jpl.nasa.gov/sentry.api".into()
}
fn default_user_agent() -> String {
    "neo-impact/0.1".into()
}
fn default_request_timeout_ms() -> u64 {
    15_000
}
fn default_page_size() -> u32 {
    20
}
fn default_requests_per_hour() -> u32 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    15 * 60
}

fn default_days_around() -> u32 {
    3
}

fn default_impactor_density() -> f64 {
    3000.0
}
fn default_target_density() -> f64 {
    2600.0
}
fn default_blast_scaling() -> f64 {
    0.8
}
fn default_crater_coefficient() -> f64 {
    1.8
}
fn default_min_crater() -> f64 {
    10.0
}
fn default_tsunami_alpha() -> f64 {
    1e-5
}
fn default_tsunami_attenuation() -> f64 {
    100.0
}
fn default_min_wave() -> f64 {
    0.1
}
fn default_population_density() -> f64 {
    300.0
}
fn default_mortality_fraction() -> f64 {
    0.2
}
fn default_cost_per_km2() -> f64 {
    100_000.0
}
fn default_cost_per_kiloton() -> f64 {
    1e6
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sentry_url: default_sentry_url(),
            user_agent: default_user_agent(),
            request_timeout_ms: default_request_timeout_ms(),
            page_size: default_page_size(),
            requests_per_hour: default_requests_per_hour(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            dir: None,
            serve_stale_on_error: false,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            days_before: default_days_around(),
            days_after: default_days_around(),
        }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            default_density_kg_per_m3: default_impactor_density(),
            target_density_kg_per_m3: default_target_density(),
            blast_scaling_km: default_blast_scaling(),
            crater_coefficient: default_crater_coefficient(),
            min_crater_diameter_m: default_min_crater(),
            tsunami_alpha: default_tsunami_alpha(),
            tsunami_attenuation_km: default_tsunami_attenuation(),
            min_wave_height_m: default_min_wave(),
            population_density_per_km2: default_population_density(),
            mortality_fraction: default_mortality_fraction(),
            cost_per_km2_usd: default_cost_per_km2(),
            cost_per_kiloton_usd: default_cost_per_kiloton(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            provider: ProviderConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            feed: FeedConfig::default(),
            impact: ImpactConfig::default(),
        }
    }
}
