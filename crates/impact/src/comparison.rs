//! Plain-language comparisons of a yield against well-known events.

use serde::Serialize;

use crate::model::JOULES_PER_MEGATON;

/// (description, yield in megatons), largest first.
const REFERENCE_EVENTS: &[(&str, f64)] = &[
    ("the Chicxulub impact (that wiped out the dinosaurs)", 100_000_000.0),
    ("the world's total annual energy consumption", 143_000.0),
    ("the 2004 Indian Ocean earthquake/tsunami", 9_600.0),
    ("the Tsar Bomba (largest nuclear device ever detonated)", 50.0),
    ("the 1980 Mount St. Helens eruption", 24.0),
    ("a major Category 5 hurricane (total lifetime energy)", 10.0),
    ("the Hiroshima atomic bomb ('Little Boy')", 0.015),
];

const NEGLIGIBLE: &str = "Negligible energy.";
const TOO_SMALL: &str = "The energy is too small for a meaningful comparison to major events.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyComparison {
    pub input_megatons: f64,
    pub energy_joules: f64,
    pub facts: Vec<String>,
}

/// Compare `megatons` against each reference event of a similar scale.
///
/// Never empty: at least one fact is always returned.
pub fn compare_energy(megatons: f64) -> EnergyComparison {
    if !(megatons.is_finite() && megatons > 0.0) {
        return EnergyComparison {
            input_megatons: 0.0,
            energy_joules: 0.0,
            facts: vec![NEGLIGIBLE.to_string()],
        };
    }

    let mut facts: Vec<String> = REFERENCE_EVENTS
        .iter()
        .filter(|(_, event_mt)| megatons > event_mt * 0.1)
        .filter_map(|(name, event_mt)| describe(megatons / event_mt, name))
        .collect();

    if facts.is_empty() {
        facts.push(TOO_SMALL.to_string());
    }

    EnergyComparison {
        input_megatons: megatons,
        energy_joules: megatons * JOULES_PER_MEGATON,
        facts,
    }
}

fn describe(ratio: f64, event: &str) -> Option<String> {
    if (0.95..=1.05).contains(&ratio) {
        Some(format!("This is almost identical to the energy of {event}."))
    } else if ratio > 1.0 {
        Some(format!(
            "This is equivalent to the energy of approximately {} times {event}.",
            group_thousands(ratio.round() as u64)
        ))
    } else if ratio > 0.01 {
        Some(format!(
            "This has about {:.0}% of the energy of {event}.",
            ratio * 100.0
        ))
    } else {
        None
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
