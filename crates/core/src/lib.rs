//! Core traits and types for wallflux.
//!
//! This crate defines the shared abstractions that the integrator and the
//! physics model build on:
//!
//! - [`Model`] — a callable that maps a typed input to a typed output
//! - [`Snapshot`] — a captured input/output pair from a model call
//! - [`Observer`] — receives solver events and optionally returns control actions
//! - [`OdeProblem`] — adapts a model's input and output to a fixed-size ODE
//!   state, and constrains accepted states to their admissible region

mod model;
mod observer;
mod problem;

pub use model::{Model, Snapshot};
pub use observer::Observer;
pub use problem::{Correction, OdeProblem, State};
