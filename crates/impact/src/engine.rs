//! Impact consequence estimates.
//!
//! Pure and deterministic: the same parameters and model always produce a
//! bit-identical estimate. Steps:
//!
//! 1. mass = sphere volume × density
//! 2. E = ½·m·v², yield = E / 4.184e12 kt
//! 3. blast radius = k · kt^(1/3) km
//! 4. crater = C · (m / ρ_target)^(1/3) · v_kms^0.25, floored
//! 5. tsunami (ocean only) = α · E^(1/3), attenuated toward the coast
//! 6. area, casualties and cost from the blast radius

use common::{Error, ImpactEstimate, ImpactParameters, TsunamiEstimate};
use std::f64::consts::PI;
use tracing::debug;

use crate::model::{ImpactModel, JOULES_PER_KILOTON};

/// Estimate with the default model.
pub fn estimate_default(params: &ImpactParameters) -> Result<ImpactEstimate, Error> {
    estimate(params, &ImpactModel::default())
}

/// Compute every consequence figure for `params`.
///
/// Fails only when diameter or velocity is not a positive finite number.
pub fn estimate(params: &ImpactParameters, model: &ImpactModel) -> Result<ImpactEstimate, Error> {
    require_positive("diameter_meters", params.diameter_meters)?;
    require_positive("velocity_km_per_sec", params.velocity_km_per_sec)?;

    let density = if params.density_kg_per_m3.is_finite() && params.density_kg_per_m3 > 0.0 {
        params.density_kg_per_m3
    } else {
        model.default_density_kg_per_m3
    };

    let mass = sphere_mass(params.diameter_meters, density);
    let energy = kinetic_energy(mass, params.velocity_km_per_sec);
    let kt = energy / JOULES_PER_KILOTON;
    let blast_m = blast_radius_m(kt, model);
    let crater_m = crater_diameter_m(mass, params.velocity_km_per_sec, model);

    let tsunami = params.is_ocean_impact.then(|| {
        let distance = if params.distance_to_coast_km.is_finite() {
            params.distance_to_coast_km.max(0.0)
        } else {
            0.0
        };
        tsunami(energy, distance, model)
    });

    let area = affected_area_km2(blast_m);
    let casualties = area * model.population_density_per_km2 * model.mortality_fraction;
    let cost = area * model.cost_per_km2_usd + kt * model.cost_per_kiloton_usd;

    debug!(
        "Impact d={}m v={}km/s: {:.3e} J, {:.1} kt, blast={:.0}m crater={:.0}m",
        params.diameter_meters, params.velocity_km_per_sec, energy, kt, blast_m, crater_m
    );

    Ok(ImpactEstimate {
        energy_joules: energy,
        kilotons_tnt: kt,
        megatons_tnt: kt / 1000.0,
        blast_radius_meters: blast_m,
        crater_diameter_meters: crater_m,
        tsunami,
        affected_area_km2: area,
        estimated_casualties: round_count(casualties),
        estimated_economic_cost_usd: round_count(cost),
    })
}

fn require_positive(field: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{field} must be a positive number, got {value}"
        )))
    }
}

/// Mass (kg) of a sphere of `diameter_m` at `density` kg/m³.
pub fn sphere_mass(diameter_m: f64, density: f64) -> f64 {
    let r = diameter_m / 2.0;
    (4.0 / 3.0) * PI * r.powi(3) * density
}

/// Kinetic energy (J) of `mass_kg` moving at `velocity_kms` km/s.
pub fn kinetic_energy(mass_kg: f64, velocity_kms: f64) -> f64 {
    let v = velocity_kms * 1000.0;
    0.5 * mass_kg * v * v
}

pub fn blast_radius_m(kilotons: f64, model: &ImpactModel) -> f64 {
    model.blast_scaling_km * kilotons.cbrt() * 1000.0
}

pub fn crater_diameter_m(mass_kg: f64, velocity_kms: f64, model: &ImpactModel) -> f64 {
    let d = model.crater_coefficient
        * (mass_kg / model.target_density_kg_per_m3).cbrt()
        * velocity_kms.powf(0.25);
    d.max(model.min_crater_diameter_m)
}

pub fn tsunami(energy_j: f64, distance_to_coast_km: f64, model: &ImpactModel) -> TsunamiEstimate {
    let source = model.tsunami_alpha * energy_j.cbrt();
    let at_coast = source / (1.0 + distance_to_coast_km / model.tsunami_attenuation_km);
    TsunamiEstimate {
        source_height_meters: source,
        height_at_coast_meters: at_coast.max(model.min_wave_height_m),
    }
}

/// Area (km²) of the circle inside the blast radius.
pub fn affected_area_km2(blast_radius_m: f64) -> f64 {
    PI * (blast_radius_m / 1000.0).powi(2)
}

// `as` saturates, so absurd inputs clamp to u64::MAX instead of wrapping.
fn round_count(x: f64) -> u64 {
    x.round().max(0.0) as u64
}
