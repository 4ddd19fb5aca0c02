//! Impact estimation crate.
//!
//! Closed-form consequence estimates for an asteroid strike, risk and
//! deflection assessments for Sentry-listed objects, and plain-language
//! comparisons of the released energy.

pub mod comparison;
pub mod engine;
pub mod model;
pub mod risk;

pub use comparison::{compare_energy, EnergyComparison};
pub use engine::{estimate, estimate_default};
pub use model::ImpactModel;
pub use risk::{assess, MitigationOutcome, RiskAssessment, RiskModel};
