//! Time integrators for wallflux models.
//!
//! Every integrator drives a [`Model`](wallflux_core::Model) through an
//! [`OdeProblem`](wallflux_core::OdeProblem), records a snapshot at each
//! sample time, and reports progress to an
//! [`Observer`](wallflux_core::Observer).

pub mod transient;
