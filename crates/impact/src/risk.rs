//! Risk assessment for Sentry-monitored objects.
//!
//! Consequences scale from the Sentry energy (airblast rings, crater) and
//! from a stony body of the Sentry diameter at `v_inf` (seismic magnitude).
//! Mitigation asks what along-track delta-v, applied at the intervention
//! date, drifts the object one Earth radius by the impact date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::SentryObject;
use serde::Serialize;
use tracing::debug;

use crate::engine::{kinetic_energy, sphere_mass};

const DAYS_PER_YEAR: f64 = 365.25;
const SECS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskModel {
    /// Assumed bulk density of the impactor.
    pub density_kg_per_m3: f64,
    /// 4 psi overpressure radius for a 1 Mt burst.
    pub heavy_damage_radius_km_per_mt: f64,
    /// 1 psi overpressure radius for a 1 Mt burst.
    pub light_damage_radius_km_per_mt: f64,
    /// Fraction of kinetic energy radiated as seismic waves.
    pub seismic_efficiency: f64,
    pub earth_radius_km: f64,
    /// Years from now until the deflection, when the impact is far enough out.
    pub intervention_lead_years: f64,
    /// Impact year assumed when Sentry lists no dated impactor.
    pub fallback_impact_year: i32,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self {
            density_kg_per_m3: 2600.0,
            heavy_damage_radius_km_per_mt: 6.2,
            light_damage_radius_km_per_mt: 17.0,
            seismic_efficiency: 1e-4,
            earth_radius_km: 6371.0,
            intervention_lead_years: 20.0,
            fallback_impact_year: 2150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consequences {
    /// 4 psi ring: most buildings collapse.
    pub destruction_radius_km: f64,
    /// 1 psi ring: windows shatter.
    pub shaking_radius_km: f64,
    pub seismic_magnitude_mw: f64,
    pub crater_diameter_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MitigationOutcome {
    Feasible,
    Impossible,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mitigation {
    /// Years from now until the deflection is applied.
    pub intervention_time_years: f64,
    /// Years between the deflection and the impact.
    pub drift_time_years: f64,
    /// None when there is no drift time left.
    pub required_delta_v_mm_per_sec: Option<f64>,
    pub target_deflection_km: f64,
    pub outcome: MitigationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub designation: String,
    pub full_name: String,
    pub cumulative_impact_probability: f64,
    /// "1 in N"; absent for a zero probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_odds: Option<f64>,
    /// Date of the most probable virtual impactor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    pub energy_mt: f64,
    pub diameter_km: f64,
    pub consequences: Consequences,
    pub mitigation: Mitigation,
}

pub fn consequences(
    energy_mt: f64,
    diameter_km: f64,
    v_inf_km_per_sec: f64,
    model: &RiskModel,
) -> Consequences {
    let scale = if energy_mt.is_finite() && energy_mt > 0.0 {
        energy_mt.cbrt()
    } else {
        0.0
    };

    let mass = sphere_mass(diameter_km * 1000.0, model.density_kg_per_m3);
    let seismic_j = kinetic_energy(mass, v_inf_km_per_sec) * model.seismic_efficiency;
    let seismic_magnitude_mw = if seismic_j.is_finite() && seismic_j > 0.0 {
        0.67 * seismic_j.log10() - 5.87
    } else {
        0.0
    };

    Consequences {
        destruction_radius_km: model.heavy_damage_radius_km_per_mt * scale,
        shaking_radius_km: model.light_damage_radius_km_per_mt * scale,
        seismic_magnitude_mw,
        crater_diameter_km: scale,
    }
}

/// Plan a deflection for an impact on `impact_date`.
///
/// The intervention happens `intervention_lead_years` from `now`, or one
/// year before impact (but no sooner than a year from now) when the impact
/// is closer than that.
pub fn mitigation(impact_date: NaiveDate, now: NaiveDateTime, model: &RiskModel) -> Mitigation {
    let to_impact = impact_date.and_time(NaiveTime::MIN) - now;
    let days = to_impact.num_days() as f64;
    let secs = to_impact.num_seconds() as f64;

    let intervention_years = if days < model.intervention_lead_years * DAYS_PER_YEAR {
        (days / DAYS_PER_YEAR - 1.0).max(1.0)
    } else {
        model.intervention_lead_years
    };
    let drift_secs = secs - intervention_years * DAYS_PER_YEAR * SECS_PER_DAY;

    let (required, outcome) = if drift_secs > 0.0 {
        let dv_m_per_s = model.earth_radius_km * 1000.0 / drift_secs;
        (Some(dv_m_per_s * 1000.0), MitigationOutcome::Feasible)
    } else {
        (None, MitigationOutcome::Impossible)
    };

    Mitigation {
        intervention_time_years: intervention_years,
        drift_time_years: (drift_secs / (DAYS_PER_YEAR * SECS_PER_DAY)).max(0.0),
        required_delta_v_mm_per_sec: required,
        target_deflection_km: model.earth_radius_km,
        outcome,
    }
}

/// Full assessment of `object` as of `now`.
pub fn assess(object: &SentryObject, now: NaiveDateTime, model: &RiskModel) -> RiskAssessment {
    let likely = object.most_likely_impact();
    let impact_date = likely
        .and_then(|vi| vi.impact_date())
        .or_else(|| NaiveDate::from_ymd_opt(model.fallback_impact_year, 1, 1))
        .unwrap_or(NaiveDate::MAX);

    let ip = object.cumulative_impact_probability;
    let assessment = RiskAssessment {
        designation: object.designation.clone(),
        full_name: object.full_name.clone(),
        cumulative_impact_probability: ip,
        impact_odds: (ip.is_finite() && ip > 0.0).then(|| (1.0 / ip).round()),
        eta: likely.map(|vi| vi.date.clone()),
        energy_mt: object.energy_mt,
        diameter_km: object.diameter_km,
        consequences: consequences(
            object.energy_mt,
            object.diameter_km,
            object.v_inf_km_per_sec,
            model,
        ),
        mitigation: mitigation(impact_date, now, model),
    };

    debug!(
        "Risk {}: ip={:.2e}, impact {}, {:?}",
        object.designation, ip, impact_date, assessment.mitigation.outcome
    );
    assessment
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::VirtualImpactor;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    fn close(actual: f64, expected: f64) -> bool {
        ((actual - expected) / expected).abs() < 1e-9
    }

    #[test]
    fn test_one_megaton_reference_rings() {
        let c = consequences(1.0, 0.0, 0.0, &RiskModel::default());
        assert_eq!(c.destruction_radius_km, 6.2);
        assert_eq!(c.shaking_radius_km, 17.0);
        assert_eq!(c.crater_diameter_km, 1.0);
        assert_eq!(c.seismic_magnitude_mw, 0.0);
    }

    #[test]
    fn test_rings_scale_with_cube_root_of_energy() {
        let c = consequences(1000.0, 0.0, 0.0, &RiskModel::default());
        assert!(close(c.destruction_radius_km, 62.0));
        assert!(close(c.shaking_radius_km, 170.0));
        assert!(close(c.crater_diameter_km, 10.0));
    }

    #[test]
    fn test_seismic_magnitude_from_kinetic_energy() {
        let model = RiskModel::default();
        let c = consequences(0.0, 0.37, 5.87, &model);
        let mass = sphere_mass(370.0, 2600.0);
        let e = kinetic_energy(mass, 5.87);
        assert!(close(c.seismic_magnitude_mw, 0.67 * (1e-4 * e).log10() - 5.87));
        assert_eq!(c.destruction_radius_km, 0.0);
    }

    #[test]
    fn test_distant_impact_uses_default_lead_time() {
        let now = at("2026-01-01");
        let impact = day("2071-01-01");
        let m = mitigation(impact, now, &RiskModel::default());

        let drift = (impact.and_time(NaiveTime::MIN) - now).num_seconds() as f64
            - 20.0 * DAYS_PER_YEAR * SECS_PER_DAY;
        assert_eq!(m.intervention_time_years, 20.0);
        assert_eq!(m.outcome, MitigationOutcome::Feasible);
        assert!(close(m.required_delta_v_mm_per_sec.unwrap(), 6371.0e6 / drift));
        assert!((8.0..8.2).contains(&m.required_delta_v_mm_per_sec.unwrap()));
    }

    #[test]
    fn test_near_impact_pushes_one_year_out() {
        let m = mitigation(day("2027-07-01"), at("2026-01-01"), &RiskModel::default());
        assert_eq!(m.intervention_time_years, 1.0);
        assert_eq!(m.outcome, MitigationOutcome::Feasible);
        assert!(m.drift_time_years > 0.4 && m.drift_time_years < 0.6);
    }

    #[test]
    fn test_imminent_or_past_impact_is_impossible() {
        for impact in ["2026-06-01", "2020-01-01"] {
            let m = mitigation(day(impact), at("2026-01-01"), &RiskModel::default());
            assert_eq!(m.outcome, MitigationOutcome::Impossible);
            assert!(m.required_delta_v_mm_per_sec.is_none());
            assert_eq!(m.drift_time_years, 0.0);
        }
    }

    #[test]
    fn test_assess_uses_most_likely_impactor() {
        let obj = SentryObject {
            designation: "29075".into(),
            full_name: "29075 (1950 DA)".into(),
            energy_mt: 7.5e4,
            diameter_km: 1.3,
            v_inf_km_per_sec: 14.1,
            cumulative_impact_probability: 2.5e-4,
            virtual_impactors: vec![
                VirtualImpactor { date: "2880-03-16.9".into(), impact_probability: 2.4e-4 },
                VirtualImpactor { date: "2881-03-16.9".into(), impact_probability: 1e-5 },
            ],
        };
        let a = assess(&obj, at("2026-01-01"), &RiskModel::default());
        assert_eq!(a.eta.as_deref(), Some("2880-03-16.9"));
        assert_eq!(a.impact_odds, Some(4000.0));
        assert_eq!(a.mitigation.intervention_time_years, 20.0);
        assert_eq!(a.mitigation.outcome, MitigationOutcome::Feasible);
    }

    #[test]
    fn test_assess_without_impactors_falls_back_to_far_future() {
        let obj = SentryObject {
            designation: "X1".into(),
            full_name: "X1".into(),
            energy_mt: 0.0,
            diameter_km: 0.0,
            v_inf_km_per_sec: 0.0,
            cumulative_impact_probability: 0.0,
            virtual_impactors: Vec::new(),
        };
        let a = assess(&obj, at("2026-01-01"), &RiskModel::default());
        assert!(a.eta.is_none());
        assert!(a.impact_odds.is_none());
        assert_eq!(a.mitigation.outcome, MitigationOutcome::Feasible);

        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("eta").is_none());
        assert_eq!(json["mitigation"]["outcome"], "FEASIBLE");
    }
}
