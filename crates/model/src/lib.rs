//! Zero-dimensional model of hydrogen recycling between a plasma and its wall.
//!
//! Two lumped inventories evolve in time:
//!
//! - `Np`, particles in the plasma, fed by fueling, prompt recycling and
//!   thermal release, and drained by wall incidence and exhaust
//! - `Nw`, particles held by the wall, which takes up a capacity-limited share
//!   of the non-recycled flux and releases it with an Arrhenius residence time
//!
//! A run starts from a [`ScenarioConfig`], usually loaded from TOML, which is
//! validated into a [`Scenario`] and integrated with [`run`]:
//!
//! ```ignore
//! use wallflux_model::{ScenarioConfig, run};
//!
//! let scenario = ScenarioConfig::reference().build()?;
//! let result = run(&scenario)?;
//! let diagnostics = result.diagnostics(&scenario)?;
//! ```
//!
//! The reference values are illustrative. See [`provenance`] for where each
//! one comes from.

pub mod config;
pub mod constants;
pub mod diagnostics;
mod error;
mod model;
mod params;
mod problem;
pub mod provenance;
mod schedule;
mod simulation;
mod trajectory;

pub use config::ScenarioConfig;
pub use diagnostics::{DEFAULT_NEAR_UNITY_THRESHOLD, DiagnosticSample};
pub use error::{ConfigError, ModelError, ParameterError, SimulationError};
pub use model::{Fluxes, RecyclingInput, WallRecycling};
pub use params::{Arrhenius, Exhaust, IncidentFlux, Inventories, ParameterSet, Parameters};
pub use problem::{PLASMA, RecyclingProblem, WALL};
pub use schedule::{Forcing, Schedule};
pub use simulation::{BoundaryViolation, Run, Scenario, run, run_observed};
pub use trajectory::{Sample, Trajectory};

pub use wallflux_solvers::transient::adaptive::{Action, Event, Method, Stats, Status};
