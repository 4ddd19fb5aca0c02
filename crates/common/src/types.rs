//! Domain types shared across the service.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::Error;

/// NeoWs refuses feed windows longer than this.
pub const MAX_FEED_WINDOW_DAYS: i64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Asteroid Records ──────────────────────────────────────────────────

/// One near-Earth object in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsteroidRecord {
    pub id: String,
    pub name: String,
    /// Max diameter estimate in meters.
    pub estimated_diameter_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter_min_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_diameter_max_meters: Option<f64>,
    pub is_potentially_hazardous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_magnitude_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nasa_jpl_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sentry_object: Option<bool>,
    /// Provider close-approach list, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_approach_data: Option<serde_json::Value>,
    /// Provider orbital elements, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbital_data: Option<serde_json::Value>,
}

// ── Feed Window ───────────────────────────────────────────────────────

/// Inclusive date range for a feed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidParameter(format!(
                "end_date {} is before start_date {}",
                end.format(DATE_FORMAT),
                start.format(DATE_FORMAT)
            )));
        }
        if (end - start).num_days() > MAX_FEED_WINDOW_DAYS {
            return Err(Error::InvalidParameter(format!(
                "feed window {}..{} exceeds {} days",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT),
                MAX_FEED_WINDOW_DAYS
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, Error> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Window spanning `days_before` to `days_after` around `today`.
    pub fn around(today: NaiveDate, days_before: u32, days_after: u32) -> Result<Self, Error> {
        Self::new(
            today - Duration::days(i64::from(days_before)),
            today + Duration::days(i64::from(days_after)),
        )
    }

    pub fn start_date(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_date(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidParameter(format!("'{raw}' is not a YYYY-MM-DD date")))
}

// ── Impact Types ──────────────────────────────────────────────────────

/// Physical inputs for an impact estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactParameters {
    pub diameter_meters: f64,
    pub velocity_km_per_sec: f64,
    #[serde(default = "default_density")]
    pub density_kg_per_m3: f64,
    /// Reserved; the current formulas ignore it.
    #[serde(default = "default_entry_angle")]
    pub entry_angle_deg: f64,
    #[serde(default)]
    pub is_ocean_impact: bool,
    #[serde(default = "default_coast_distance")]
    pub distance_to_coast_km: f64,
}

impl ImpactParameters {
    /// Land impact with default density and angle.
    pub fn new(diameter_meters: f64, velocity_km_per_sec: f64) -> Self {
        Self {
            diameter_meters,
            velocity_km_per_sec,
            density_kg_per_m3: default_density(),
            entry_angle_deg: default_entry_angle(),
            is_ocean_impact: false,
            distance_to_coast_km: default_coast_distance(),
        }
    }
}

fn default_density() -> f64 {
    3000.0
}
fn default_entry_angle() -> f64 {
    45.0
}
fn default_coast_distance() -> f64 {
    50.0
}

/// Wave heights for an ocean impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TsunamiEstimate {
    pub source_height_meters: f64,
    pub height_at_coast_meters: f64,
}

/// Derived consequences of one impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub energy_joules: f64,
    pub kilotons_tnt: f64,
    pub megatons_tnt: f64,
    pub blast_radius_meters: f64,
    pub crater_diameter_meters: f64,
    /// Absent for land impacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsunami: Option<TsunamiEstimate>,
    pub affected_area_km2: f64,
    pub estimated_casualties: u64,
    pub estimated_economic_cost_usd: u64,
}

// ── Sentry Risk Objects ───────────────────────────────────────────────

/// One virtual impactor from the JPL Sentry risk table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualImpactor {
    /// Sentry date, e.g. `2071-09-16.04` (fractional day).
    pub date: String,
    pub impact_probability: f64,
}

impl VirtualImpactor {
    /// Calendar day of the impact; the fractional day is dropped.
    pub fn impact_date(&self) -> Option<NaiveDate> {
        let day = self.date.trim().split(['.', ' ']).next()?;
        NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
    }
}

/// Sentry summary for one monitored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentryObject {
    pub designation: String,
    pub full_name: String,
    /// Impact energy in megatons of TNT.
    pub energy_mt: f64,
    pub diameter_km: f64,
    /// Velocity relative to Earth before gravitational acceleration.
    pub v_inf_km_per_sec: f64,
    pub cumulative_impact_probability: f64,
    #[serde(default)]
    pub virtual_impactors: Vec<VirtualImpactor>,
}

impl SentryObject {
    /// Virtual impactor with the highest probability. Ties go to the
    /// earliest listed.
    pub fn most_likely_impact(&self) -> Option<&VirtualImpactor> {
        self.virtual_impactors.iter().fold(None, |best, vi| match best {
            Some(b) if b.impact_probability >= vi.impact_probability => Some(b),
            _ => Some(vi),
        })
    }
}
