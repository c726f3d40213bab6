//! Where each reference parameter comes from.
//!
//! The reference scenario is qualitative. Most of its values are assumed to
//! produce illustrative behavior and carry no predictive weight.

use std::fmt;

use crate::constants::BOLTZMANN_EV_PER_K;

/// Origin of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// A CODATA physical constant.
    PhysicalConstant,

    /// Chosen for illustration without a fit or citation.
    Assumed,

    /// Derived inside this repository from other reference values.
    FittedInRepo,

    /// Taken from published work.
    Literature,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PhysicalConstant => "physical constant",
            Self::Assumed => "assumed",
            Self::FittedInRepo => "fitted in repo",
            Self::Literature => "literature",
        };
        f.write_str(label)
    }
}

/// One row of the provenance table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvenanceEntry {
    /// Key in the scenario file, or a descriptive name for structural choices.
    pub key: &'static str,
    pub symbol: &'static str,

    /// Reference value, `None` for structural choices.
    pub value: Option<f64>,
    pub unit: &'static str,
    pub provenance: Provenance,
    pub note: &'static str,
}

/// Provenance of every value in [`ScenarioConfig::reference`](crate::ScenarioConfig::reference).
pub const REFERENCE_PROVENANCE: &[ProvenanceEntry] = &[
    ProvenanceEntry {
        key: "boltzmann",
        symbol: "kB",
        value: Some(BOLTZMANN_EV_PER_K),
        unit: "eV/K",
        provenance: Provenance::PhysicalConstant,
        note: "CODATA 2018",
    },
    ProvenanceEntry {
        key: "recycling",
        symbol: "R0",
        value: Some(0.992),
        unit: "-",
        provenance: Provenance::Assumed,
        note: "illustrative prompt recycling",
    },
    ProvenanceEntry {
        key: "wall_capacity",
        symbol: "Nw_max",
        value: Some(1.15e23),
        unit: "particles",
        provenance: Provenance::Assumed,
        note: "effective wall capacity",
    },
    ProvenanceEntry {
        key: "incident_flux.confinement_time_s",
        symbol: "tau_p",
        value: Some(3.5),
        unit: "s",
        provenance: Provenance::Assumed,
        note: "effective particle confinement time",
    },
    ProvenanceEntry {
        key: "release.prefactor_s",
        symbol: "tau0",
        value: Some(1.0e-12),
        unit: "s",
        provenance: Provenance::Assumed,
        note: "phenomenological Arrhenius prefactor",
    },
    ProvenanceEntry {
        key: "release.activation_energy_ev",
        symbol: "Ea",
        value: Some(1.05),
        unit: "eV",
        provenance: Provenance::Assumed,
        note: "effective activation energy",
    },
    ProvenanceEntry {
        key: "fueling.base",
        symbol: "S_in",
        value: Some(1.2e22),
        unit: "particles/s",
        provenance: Provenance::Assumed,
        note: "smooth step, gain 1.8, center 15 s, width 4 s",
    },
    ProvenanceEntry {
        key: "exhaust.pump_per_s",
        symbol: "k_pump",
        value: Some(5.6e-4),
        unit: "1/s",
        provenance: Provenance::FittedInRepo,
        note: "sink of 1e18 particles/s at the initial plasma inventory",
    },
    ProvenanceEntry {
        key: "wall_temperature.base",
        symbol: "T0",
        value: Some(573.0),
        unit: "K",
        provenance: Provenance::Assumed,
        note: "baseline, ramped by 820 K over 45 s from t = 50 s with exponent 3.1",
    },
    ProvenanceEntry {
        key: "initial.plasma",
        symbol: "Np(0)",
        value: Some(1.8e21),
        unit: "particles",
        provenance: Provenance::Assumed,
        note: "initial plasma inventory",
    },
    ProvenanceEntry {
        key: "initial.wall",
        symbol: "Nw(0)",
        value: Some(3.2e22),
        unit: "particles",
        provenance: Provenance::Assumed,
        note: "initial wall inventory",
    },
    ProvenanceEntry {
        key: "near_unity_threshold",
        symbol: "R_mark",
        value: Some(0.995),
        unit: "-",
        provenance: Provenance::Assumed,
        note: "heuristic display marker",
    },
    ProvenanceEntry {
        key: "global particle balance",
        symbol: "-",
        value: None,
        unit: "-",
        provenance: Provenance::Literature,
        note: "two-reservoir framing used for long-pulse tokamak particle balance",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{
        config::{ExhaustConfig, IncidentFluxConfig, ScenarioConfig},
        schedule::Schedule,
    };

    fn value(key: &str) -> f64 {
        REFERENCE_PROVENANCE
            .iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value)
            .unwrap_or_else(|| panic!("no value for {key}"))
    }

    #[test]
    fn table_matches_reference_scenario() {
        let reference = ScenarioConfig::reference();

        assert_eq!(value("recycling"), reference.recycling);
        assert_eq!(value("wall_capacity"), reference.wall_capacity);
        assert_eq!(value("release.prefactor_s"), reference.release.prefactor_s);
        assert_eq!(
            value("release.activation_energy_ev"),
            reference.release.activation_energy_ev
        );
        assert_eq!(value("initial.plasma"), reference.initial.plasma);
        assert_eq!(value("initial.wall"), reference.initial.wall);
        assert_eq!(value("near_unity_threshold"), reference.near_unity_threshold);

        let IncidentFluxConfig::Confinement { confinement_time_s } = reference.incident_flux else {
            panic!("reference uses confinement");
        };
        assert_eq!(value("incident_flux.confinement_time_s"), confinement_time_s);

        let ExhaustConfig::Proportional { pump_per_s } = reference.exhaust else {
            panic!("reference uses proportional exhaust");
        };
        assert_eq!(value("exhaust.pump_per_s"), pump_per_s);

        let Schedule::SmoothStep { base, .. } = reference.fueling else {
            panic!("reference fueling is a smooth step");
        };
        assert_eq!(value("fueling.base"), base);

        let Schedule::PowerRamp { base, .. } = reference.wall_temperature else {
            panic!("reference wall temperature is a power ramp");
        };
        assert_eq!(value("wall_temperature.base"), base);
    }

    #[test]
    fn pump_coefficient_reproduces_constant_sink() {
        let sink = value("exhaust.pump_per_s") * value("initial.plasma");
        assert_relative_eq!(sink, 1.0e18, max_relative = 0.01);
    }

    #[test]
    fn every_class_is_represented() {
        for class in [
            Provenance::PhysicalConstant,
            Provenance::Assumed,
            Provenance::FittedInRepo,
            Provenance::Literature,
        ] {
            assert!(REFERENCE_PROVENANCE.iter().any(|e| e.provenance == class));
        }
        assert_eq!(Provenance::FittedInRepo.to_string(), "fitted in repo");
    }
}
