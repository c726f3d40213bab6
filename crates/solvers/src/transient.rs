//! Solvers for transient problems that advance a model state through time.
//!
//! # Solvers
//!
//! - [`adaptive`] — error-controlled integration on a fixed sample grid, with
//!   a stiff Rosenbrock method and two explicit Dormand–Prince methods

pub mod adaptive;
