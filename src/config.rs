//! Configuration loader: `.env`, then `config.toml`, then environment overrides.

use common::config::AppConfig;
use common::types::MAX_FEED_WINDOW_DAYS;
use common::Error;
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_non_negative_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("{env_name} must be a number >= 0")))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(Error::Config(format!("{env_name} must be a number >= 0")));
    }
    Ok(parsed)
}

fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered != "0" && lowered != "false" && lowered != "no" && lowered != "off"
}

fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.api_key.trim().is_empty() {
        issues.push("api_key must not be empty (set NASA_API_KEY or use DEMO_KEY)".into());
    }

    let base_url = config.provider.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        issues.push("provider.base_url must be an http(s) URL".into());
    }
    let sentry_url = config.provider.sentry_url.trim();
    if !(sentry_url.starts_with("http://") || sentry_url.starts_with("https://")) {
        issues.push("provider.sentry_url must be an http(s) URL".into());
    }
    if config.provider.request_timeout_ms == 0 {
        issues.push("provider.request_timeout_ms must be > 0".into());
    }
    if config.provider.page_size == 0 || config.provider.page_size > 20 {
        issues.push("provider.page_size must be in [1,20]".into());
    }
    if config.provider.requests_per_hour == 0 {
        issues.push("provider.requests_per_hour must be > 0".into());
    }

    if config.retry.max_attempts == 0 {
        issues.push("retry.max_attempts must be >= 1".into());
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        issues.push("retry.base_delay_ms must be <= retry.max_delay_ms".into());
    }

    if config.cache.ttl_secs == 0 {
        issues.push("cache.ttl_secs must be > 0".into());
    }
    if matches!(&config.cache.dir, Some(dir) if dir.trim().is_empty()) {
        issues.push("cache.dir must not be blank when set".into());
    }

    let span = i64::from(config.feed.days_before) + i64::from(config.feed.days_after);
    if span > MAX_FEED_WINDOW_DAYS {
        issues.push(format!(
            "feed.days_before + feed.days_after must be <= {MAX_FEED_WINDOW_DAYS}"
        ));
    }

    let impact = &config.impact;
    for (name, value) in [
        ("impact.default_density_kg_per_m3", impact.default_density_kg_per_m3),
        ("impact.target_density_kg_per_m3", impact.target_density_kg_per_m3),
        ("impact.blast_scaling_km", impact.blast_scaling_km),
        ("impact.crater_coefficient", impact.crater_coefficient),
        ("impact.tsunami_alpha", impact.tsunami_alpha),
        ("impact.tsunami_attenuation_km", impact.tsunami_attenuation_km),
    ] {
        if !(value.is_finite() && value > 0.0) {
            issues.push(format!("{name} must be > 0"));
        }
    }
    for (name, value) in [
        ("impact.min_crater_diameter_m", impact.min_crater_diameter_m),
        ("impact.min_wave_height_m", impact.min_wave_height_m),
        ("impact.population_density_per_km2", impact.population_density_per_km2),
        ("impact.cost_per_km2_usd", impact.cost_per_km2_usd),
        ("impact.cost_per_kiloton_usd", impact.cost_per_kiloton_usd),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            issues.push(format!("{name} must be >= 0"));
        }
    }
    if !(0.0..=1.0).contains(&impact.mortality_fraction) {
        issues.push("impact.mortality_fraction must be in [0,1]".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply `NASA_API_KEY`, `NEOWS_BASE_URL` and the `NEO_*` overrides.
fn apply_env_overrides<F>(config: &mut AppConfig, var: F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = var("NASA_API_KEY") {
        if !key.trim().is_empty() {
            config.api_key = key.trim().to_string();
        }
    }
    if let Some(url) = var("NEOWS_BASE_URL") {
        config.provider.base_url = url.trim().to_string();
    }
    if let Some(url) = var("SENTRY_API_URL") {
        config.provider.sentry_url = url.trim().to_string();
    }
    if let Some(raw) = var("NEO_CACHE_TTL_SECS") {
        config.cache.ttl_secs = parse_positive_u64(&raw, "NEO_CACHE_TTL_SECS")?;
    }
    if let Some(dir) = var("NEO_CACHE_DIR") {
        config.cache.dir = Some(dir.trim().to_string()).filter(|d| !d.is_empty());
    }
    if let Some(raw) = var("NEO_MAX_ATTEMPTS") {
        let attempts = parse_positive_u64(&raw, "NEO_MAX_ATTEMPTS")?;
        config.retry.max_attempts = u32::try_from(attempts)
            .map_err(|_| Error::Config("NEO_MAX_ATTEMPTS is too large".into()))?;
    }
    if let Some(raw) = var("NEO_SERVE_STALE") {
        config.cache.serve_stale_on_error = parse_bool(&raw);
    }
    if let Some(raw) = var("NEO_POPULATION_DENSITY") {
        config.impact.population_density_per_km2 =
            parse_non_negative_f64(&raw, "NEO_POPULATION_DENSITY")?;
    }
    if let Some(raw) = var("NEO_MORTALITY_FRACTION") {
        config.impact.mortality_fraction = parse_non_negative_f64(&raw, "NEO_MORTALITY_FRACTION")?;
    }
    Ok(())
}

/// Load configuration from the environment and an optional `config.toml`.
pub fn load_config() -> Result<AppConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Defaults, or config.toml if present.
    let mut config = load_file(Path::new("config.toml"))?;

    // 3. Environment variables win.
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    validate_config(&config)?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<AppConfig, Error> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.api_key, "DEMO_KEY");
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("NASA_API_KEY", " abc123 "),
                ("NEO_CACHE_TTL_SECS", "60"),
                ("NEO_CACHE_DIR", "/tmp/neo"),
                ("NEO_MAX_ATTEMPTS", "5"),
                ("NEO_SERVE_STALE", "yes"),
                ("NEO_MORTALITY_FRACTION", "0.5"),
                ("SENTRY_API_URL", " http://localhost:8080/sentry.api "),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.dir.as_deref(), Some("/tmp/neo"));
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.cache.serve_stale_on_error);
        assert_eq!(config.impact.mortality_fraction, 0.5);
        assert_eq!(config.provider.sentry_url, "http://localhost:8080/sentry.api");
    }

    #[test]
    fn test_blank_api_key_keeps_demo_key() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[("NASA_API_KEY", "  ")])).unwrap();
        assert_eq!(config.api_key, "DEMO_KEY");
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("NEO_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = apply_env_overrides(&mut config, env(&[("NEO_POPULATION_DENSITY", "-1")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let mut config = AppConfig::default();
        config.provider.page_size = 50;
        config.retry.max_attempts = 0;
        config.impact.mortality_fraction = 1.5;
        config.provider.sentry_url = "ssd-api.jpl.nasa.gov/sentry.api".into();

        let Err(Error::Config(msg)) = validate_config(&config) else {
            panic!("expected config error");
        };
        assert!(msg.starts_with("Invalid config:"));
        assert!(msg.contains("provider.page_size"));
        assert!(msg.contains("retry.max_attempts"));
        assert!(msg.contains("impact.mortality_fraction"));
        assert!(msg.contains("provider.sentry_url"));
    }

    #[test]
    fn test_feed_window_too_wide() {
        let mut config = AppConfig::default();
        config.feed.days_before = 5;
        config.feed.days_after = 5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_toml_file_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_key = \"from-file\"\n[cache]\nttl_secs = 30\n[impact]\npopulation_density_per_km2 = 50.0\n",
        )
        .unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.impact.population_density_per_km2, 50.0);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_file(Path::new("/nonexistent/neo-impact/config.toml")).unwrap();
        assert_eq!(config.provider.page_size, 20);
    }
}
