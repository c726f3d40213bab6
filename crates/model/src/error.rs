use std::{io, path::PathBuf};

use wallflux_solvers::transient::adaptive;

/// A non-physical or malformed model configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("schedule `{name}` is invalid: {reason}")]
    Schedule { name: &'static str, reason: String },

    #[error("invalid integration settings: {0}")]
    Integration(String),
}

/// A failed evaluation of the model closures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("schedule `{name}` failed at t = {t}: {reason}")]
    Schedule {
        name: &'static str,
        t: f64,
        reason: String,
    },

    #[error("wall temperature must be positive, got {kelvin} K at t = {t}")]
    NonPositiveTemperature { t: f64, kelvin: f64 },

    #[error("non-finite {quantity} at t = {t}")]
    NonFinite { quantity: &'static str, t: f64 },
}

/// A scenario file that could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level failure of a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),

    #[error("numerical instability: {0}")]
    NumericalInstability(#[source] adaptive::Error),

    #[error("model evaluation failed: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<adaptive::Error> for SimulationError {
    /// Non-physical model evaluations surface as [`SimulationError::Model`].
    /// Everything else the integrator reports, non-finite values included, is
    /// a numerical instability.
    fn from(err: adaptive::Error) -> Self {
        match err {
            adaptive::Error::Model(source) => match source.downcast::<ModelError>() {
                Ok(model_err) if matches!(*model_err, ModelError::NonFinite { .. }) => {
                    Self::NumericalInstability(adaptive::Error::Model(model_err))
                }
                Ok(model_err) => Self::Model(*model_err),
                Err(source) => Self::NumericalInstability(adaptive::Error::Model(source)),
            },
            other => Self::NumericalInstability(other),
        }
    }
}
