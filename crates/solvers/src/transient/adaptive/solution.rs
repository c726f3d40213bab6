use wallflux_core::{Correction, Snapshot};

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached the final sample time.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// Work counters accumulated over a whole integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of derivative evaluations.
    pub evaluations: u64,

    /// Number of Jacobian evaluations, analytic or by finite differences.
    pub jacobians: u64,

    /// Number of accepted internal steps.
    pub accepted_steps: u64,

    /// Number of rejected internal steps.
    pub rejected_steps: u64,
}

impl Stats {
    /// Total number of attempted internal steps.
    pub fn attempted_steps(&self) -> u64 {
        self.accepted_steps + self.rejected_steps
    }
}

/// The result of an adaptive integration.
#[derive(Debug, Clone)]
pub struct Solution<I, O> {
    /// How the solver terminated.
    pub status: Status,

    /// History of snapshots at each sample time (including initial state).
    pub history: Vec<Snapshot<I, O>>,

    /// Number of samples integrated.
    pub steps: usize,

    /// Boundary corrections whose excursion exceeded the absolute tolerance.
    pub violations: Vec<Correction>,

    /// Work counters.
    pub stats: Stats,
}
