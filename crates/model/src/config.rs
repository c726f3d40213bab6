use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use uom::si::{
    energy::electronvolt,
    f64::{Energy, Frequency, Time},
    frequency::hertz,
    time::second,
};
use wallflux_solvers::transient::adaptive;

use crate::{
    diagnostics::DEFAULT_NEAR_UNITY_THRESHOLD,
    error::{ConfigError, ParameterError},
    model::WallRecycling,
    params::{Arrhenius, Exhaust, IncidentFlux, Inventories, ParameterSet, Parameters},
    schedule::{Forcing, Schedule},
    simulation::Scenario,
};

/// A complete scenario as read from a TOML file.
///
/// Every field defaults to the reference scenario, so a file only needs to
/// list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Prompt recycling coefficient `R0`.
    pub recycling: f64,

    /// Wall capacity `Nw_max` in particles.
    pub wall_capacity: f64,

    pub release: ReleaseConfig,

    /// Fueling rate in particles/s.
    pub fueling: Schedule,

    pub exhaust: ExhaustConfig,
    pub incident_flux: IncidentFluxConfig,

    /// Wall temperature in kelvin.
    pub wall_temperature: Schedule,

    pub initial: InitialConfig,

    /// Start time in seconds.
    pub t_start: f64,

    /// End time in seconds.
    pub t_end: f64,

    /// Spacing of recorded samples in seconds.
    pub sample_interval: f64,

    pub method: MethodConfig,

    /// Budget of attempted internal steps for the whole run.
    pub max_steps: u64,

    /// `R_eff` at which samples are marked near-unity.
    pub near_unity_threshold: f64,
}

/// Arrhenius release closure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Pre-exponential time scale `τ0` in seconds.
    pub prefactor_s: f64,

    /// Activation energy `Ea` in eV.
    pub activation_energy_ev: f64,
}

/// Pumped exhaust closure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExhaustConfig {
    /// `pump · Np`, with `pump` in 1/s.
    Proportional { pump_per_s: f64 },

    /// A fixed sink in particles/s.
    Constant { rate: f64 },
}

/// Incident flux closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncidentFluxConfig {
    /// `Np / τ_p`, with `τ_p` in seconds.
    Confinement { confinement_time_s: f64 },

    /// A schedule in particles/s.
    Prescribed { schedule: Schedule },
}

/// Initial inventories in particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitialConfig {
    pub plasma: f64,
    pub wall: f64,
}

/// Integration method and tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodConfig {
    Rosenbrock { rel_tol: f64, abs_tol: f64 },
    Dopri5 { rel_tol: f64, abs_tol: f64 },
    Dop853 { rel_tol: f64, abs_tol: f64 },
}

impl From<MethodConfig> for adaptive::Method {
    fn from(config: MethodConfig) -> Self {
        match config {
            MethodConfig::Rosenbrock { rel_tol, abs_tol } => Self::Rosenbrock { rel_tol, abs_tol },
            MethodConfig::Dopri5 { rel_tol, abs_tol } => Self::Dopri5 { rel_tol, abs_tol },
            MethodConfig::Dop853 { rel_tol, abs_tol } => Self::Dop853 { rel_tol, abs_tol },
        }
    }
}

impl ScenarioConfig {
    /// The reference scenario.
    ///
    /// See [`crate::provenance`] for where each value comes from.
    pub fn reference() -> Self {
        Self {
            recycling: 0.992,
            wall_capacity: 1.15e23,
            release: ReleaseConfig::default(),
            fueling: Schedule::SmoothStep {
                base: 1.2e22,
                gain: 1.8,
                center: 15.0,
                width: 4.0,
            },
            exhaust: ExhaustConfig::Proportional { pump_per_s: 5.6e-4 },
            incident_flux: IncidentFluxConfig::Confinement {
                confinement_time_s: 3.5,
            },
            wall_temperature: Schedule::PowerRamp {
                base: 573.0,
                start: 50.0,
                amplitude: 820.0,
                duration: 45.0,
                exponent: 3.1,
            },
            initial: InitialConfig::default(),
            t_start: 0.0,
            t_end: 180.0,
            sample_interval: 0.5,
            method: MethodConfig::Rosenbrock {
                rel_tol: 1e-6,
                abs_tol: 1e12,
            },
            max_steps: adaptive::DEFAULT_MAX_STEPS,
            near_unity_threshold: DEFAULT_NEAR_UNITY_THRESHOLD,
        }
    }

    /// Parses a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid scenario.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates the scenario and builds everything a run needs.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] for any non-physical parameter or unusable
    /// integration setting.
    pub fn build(&self) -> Result<Scenario, ParameterError> {
        let exhaust = match self.exhaust {
            ExhaustConfig::Proportional { pump_per_s } => Exhaust::Proportional {
                pump: Frequency::new::<hertz>(pump_per_s),
            },
            ExhaustConfig::Constant { rate } => Exhaust::Constant { rate },
        };

        let incident_flux = match &self.incident_flux {
            IncidentFluxConfig::Confinement { confinement_time_s } => IncidentFlux::Confinement {
                confinement_time: Time::new::<second>(*confinement_time_s),
            },
            IncidentFluxConfig::Prescribed { schedule } => {
                IncidentFlux::Prescribed(Forcing::new("incident_flux", schedule)?)
            }
        };

        let set = ParameterSet {
            recycling: self.recycling,
            wall_capacity: self.wall_capacity,
            release: Arrhenius {
                prefactor: Time::new::<second>(self.release.prefactor_s),
                activation_energy: Energy::new::<electronvolt>(self.release.activation_energy_ev),
            },
            fueling: Forcing::new("fueling", &self.fueling)?,
            exhaust,
            incident_flux,
            wall_temperature: Forcing::new("wall_temperature", &self.wall_temperature)?,
            initial: Inventories {
                plasma: self.initial.plasma,
                wall: self.initial.wall,
            },
        };
        let params = Parameters::new(set, self.t_start)?;

        if !self.near_unity_threshold.is_finite() {
            return Err(ParameterError::NonFinite {
                name: "near_unity_threshold",
                value: self.near_unity_threshold,
            });
        }

        let solver = adaptive::Config::new(self.t_end, self.sample_interval)
            .with_method(self.method.into())
            .with_max_steps(self.max_steps);
        solver
            .validate(self.t_start)
            .map_err(|err| ParameterError::Integration(err.to_string()))?;

        Ok(Scenario {
            model: WallRecycling::new(params),
            t_start: self.t_start,
            solver,
            near_unity_threshold: self.near_unity_threshold,
        })
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            prefactor_s: 1.0e-12,
            activation_energy_ev: 1.05,
        }
    }
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            plasma: 1.8e21,
            wall: 3.2e22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_builds() {
        let scenario = ScenarioConfig::reference().build().unwrap();
        assert_eq!(scenario.t_start, 0.0);
        assert_eq!(scenario.solver.t_end, 180.0);
        assert_eq!(scenario.solver.method.name(), "rosenbrock");
        assert_eq!(scenario.near_unity_threshold, 0.995);
    }

    #[test]
    fn partial_file_overrides_reference() {
        let text = r#"
            recycling = 0.98
            t_end = 20.0

            [wall_temperature]
            kind = "constant"
            value = 600.0

            [method]
            kind = "dopri5"
            rel_tol = 1e-8
            abs_tol = 1e10
        "#;

        let config = ScenarioConfig::from_toml_str(text).unwrap();

        assert_eq!(config.recycling, 0.98);
        assert_eq!(config.t_end, 20.0);
        assert_eq!(config.wall_temperature, Schedule::Constant { value: 600.0 });
        assert_eq!(
            config.method,
            MethodConfig::Dopri5 {
                rel_tol: 1e-8,
                abs_tol: 1e10
            }
        );
        assert_eq!(config.wall_capacity, ScenarioConfig::reference().wall_capacity);
        assert_eq!(config.release, ReleaseConfig::default());
    }

    #[test]
    fn prescribed_flux_and_constant_exhaust_parse() {
        let text = r#"
            [exhaust]
            kind = "constant"
            rate = 1e18

            [incident_flux]
            kind = "prescribed"

            [incident_flux.schedule]
            kind = "table"
            points = [[0.0, 1e20], [10.0, 3e20]]
        "#;

        let config = ScenarioConfig::from_toml_str(text).unwrap();
        assert_eq!(config.exhaust, ExhaustConfig::Constant { rate: 1e18 });
        assert!(matches!(
            config.incident_flux,
            IncidentFluxConfig::Prescribed {
                schedule: Schedule::Table { .. }
            }
        ));
        assert!(config.build().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = ScenarioConfig::from_toml_str("recyling = 0.9");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_settings_fail_to_build() {
        let mut config = ScenarioConfig::reference();
        config.sample_interval = 0.0;
        assert!(matches!(
            config.build(),
            Err(ParameterError::Integration(_))
        ));

        let mut config = ScenarioConfig::reference();
        config.wall_capacity = -1.0;
        assert!(config.build().is_err());

        let mut config = ScenarioConfig::reference();
        config.incident_flux = IncidentFluxConfig::Confinement {
            confinement_time_s: 0.0,
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = ScenarioConfig::load("does/not/exist.toml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
