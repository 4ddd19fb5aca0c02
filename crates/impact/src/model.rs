//! Scaling constants for the impact formulas.
//!
//! These are order-of-magnitude heuristics scaled from nuclear-effects
//! tables and pi-scaling crater laws, not validated physics.

use common::config::ImpactConfig;

/// Joules per kiloton of TNT.
pub const JOULES_PER_KILOTON: f64 = 4.184e12;

/// Joules per megaton of TNT.
pub const JOULES_PER_MEGATON: f64 = 4.184e15;

#[derive(Debug, Clone, PartialEq)]
pub struct ImpactModel {
    /// Used when a request carries a non-positive density.
    pub default_density_kg_per_m3: f64,
    pub target_density_kg_per_m3: f64,
    /// Blast radius in km per kt^(1/3).
    pub blast_scaling_km: f64,
    pub crater_coefficient: f64,
    pub min_crater_diameter_m: f64,
    /// Source wave height in m per J^(1/3).
    pub tsunami_alpha: f64,
    pub tsunami_attenuation_km: f64,
    pub min_wave_height_m: f64,
    /// Uniform, no geographic population data behind it.
    pub population_density_per_km2: f64,
    pub mortality_fraction: f64,
    pub cost_per_km2_usd: f64,
    pub cost_per_kiloton_usd: f64,
}

impl Default for ImpactModel {
    fn default() -> Self {
        Self::from(&ImpactConfig::default())
    }
}

impl From<&ImpactConfig> for ImpactModel {
    fn from(cfg: &ImpactConfig) -> Self {
        Self {
            default_density_kg_per_m3: cfg.default_density_kg_per_m3,
            target_density_kg_per_m3: cfg.target_density_kg_per_m3,
            blast_scaling_km: cfg.blast_scaling_km,
            crater_coefficient: cfg.crater_coefficient,
            min_crater_diameter_m: cfg.min_crater_diameter_m,
            tsunami_alpha: cfg.tsunami_alpha,
            tsunami_attenuation_km: cfg.tsunami_attenuation_km,
            min_wave_height_m: cfg.min_wave_height_m,
            population_density_per_km2: cfg.population_density_per_km2,
            mortality_fraction: cfg.mortality_fraction,
            cost_per_km2_usd: cfg.cost_per_km2_usd,
            cost_per_kiloton_usd: cfg.cost_per_kiloton_usd,
        }
    }
}
