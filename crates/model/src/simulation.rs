use wallflux_core::{Correction, Observer};
use wallflux_solvers::transient::adaptive::{self, Action, Event, Stats, Status};

use crate::{
    diagnostics::{self, DiagnosticSample},
    error::{ModelError, SimulationError},
    model::{Fluxes, RecyclingInput, WallRecycling},
    problem::RecyclingProblem,
    trajectory::{Sample, Trajectory},
};

/// A validated model together with its integration settings.
#[derive(Debug)]
pub struct Scenario {
    pub model: WallRecycling,

    /// Time of the initial inventories, in seconds.
    pub t_start: f64,

    pub solver: adaptive::Config,

    /// `R_eff` at which diagnostics flag a sample as near-unity.
    pub near_unity_threshold: f64,
}

/// An inventory clamped back into its admissible region during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryViolation {
    /// `"plasma"` or `"wall"`.
    pub variable: &'static str,
    pub t: f64,

    /// Value the integrator produced.
    pub raw: f64,

    /// Value the run continued from.
    pub clamped: f64,
}

impl From<Correction> for BoundaryViolation {
    fn from(correction: Correction) -> Self {
        Self {
            variable: correction.variable,
            t: correction.t,
            raw: correction.raw,
            clamped: correction.corrected,
        }
    }
}

/// The outcome of a run.
#[derive(Debug, Clone)]
pub struct Run {
    pub status: Status,
    pub trajectory: Trajectory,
    pub violations: Vec<BoundaryViolation>,
    pub stats: Stats,
}

impl Run {
    /// Evaluates the per-sample diagnostics of this run.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the closures fail at any sample.
    pub fn diagnostics(&self, scenario: &Scenario) -> Result<Vec<DiagnosticSample>, ModelError> {
        diagnostics::evaluate(
            &scenario.model,
            &self.trajectory,
            scenario.near_unity_threshold,
        )
    }
}

/// Integrates a scenario from its initial inventories to `t_end`.
///
/// # Errors
///
/// Returns [`SimulationError::NumericalInstability`] if the integration cannot
/// proceed, or [`SimulationError::Model`] if a closure becomes non-physical.
pub fn run(scenario: &Scenario) -> Result<Run, SimulationError> {
    run_observed(scenario, ())
}

/// Integrates a scenario, passing every sample to `observer`.
///
/// The observer may stop the run early with [`Action::StopEarly`], in which
/// case the returned run holds the samples reached so far.
///
/// # Errors
///
/// Returns an error under the same conditions as [`run`].
pub fn run_observed<Obs>(scenario: &Scenario, mut observer: Obs) -> Result<Run, SimulationError>
where
    Obs: Observer<Event<RecyclingInput, Fluxes>, Action>,
{
    let params = scenario.model.params();
    let problem = RecyclingProblem::new(params);
    let initial = RecyclingInput {
        time: scenario.t_start,
        inventories: params.initial(),
    };

    tracing::info!(
        t_start = scenario.t_start,
        t_end = scenario.solver.t_end,
        method = scenario.solver.method.name(),
        "starting recycling run"
    );

    let logged = |event: &Event<RecyclingInput, Fluxes>| {
        let input = &event.snapshot.input;
        tracing::debug!(
            step = event.step,
            t = input.time,
            plasma = input.inventories.plasma,
            wall = input.inventories.wall,
            "sample"
        );
        observer.observe(event)
    };

    let solution = adaptive::solve::<_, _, _, 2>(
        &scenario.model,
        &problem,
        initial,
        &scenario.solver,
        logged,
    )?;

    let mut trajectory = Trajectory::with_capacity(solution.history.len());
    for snapshot in &solution.history {
        let input = &snapshot.input;
        trajectory.push(Sample {
            t: input.time,
            plasma: input.inventories.plasma,
            wall: input.inventories.wall,
        });
    }

    let run = Run {
        status: solution.status,
        trajectory,
        violations: solution.violations.into_iter().map(Into::into).collect(),
        stats: solution.stats,
    };

    if let Some(last) = run.trajectory.last() {
        tracing::info!(
            t = last.t,
            plasma = last.plasma,
            wall = last.wall,
            samples = run.trajectory.len(),
            violations = run.violations.len(),
            accepted = run.stats.accepted_steps,
            rejected = run.stats.rejected_steps,
            "recycling run finished"
        );
    }

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{config::ScenarioConfig, schedule::Schedule};

    fn short_scenario() -> Scenario {
        let mut config = ScenarioConfig::reference();
        config.wall_temperature = Schedule::Constant { value: 573.0 };
        config.t_end = 5.0;
        config.build().unwrap()
    }

    #[test]
    fn records_every_sample_from_the_initial_state() {
        let scenario = short_scenario();
        let run = run(&scenario).unwrap();

        assert_eq!(run.status, Status::Complete);
        assert_eq!(run.trajectory.len(), 11);

        let first = run.trajectory.first().unwrap();
        assert_eq!(first.t, 0.0);
        assert_eq!(first.plasma, 1.8e21);
        assert_eq!(first.wall, 3.2e22);
        assert_relative_eq!(run.trajectory.last().unwrap().t, 5.0);
        assert!(run.stats.accepted_steps > 0);
    }

    #[test]
    fn observer_sees_samples_and_can_stop() {
        let scenario = short_scenario();
        let mut times = Vec::new();

        let run = run_observed(&scenario, |event: &Event<RecyclingInput, Fluxes>| {
            times.push(event.snapshot.input.time);
            (event.step == 3).then_some(Action::StopEarly)
        })
        .unwrap();

        assert_eq!(run.status, Status::StoppedByObserver);
        assert_eq!(run.trajectory.len(), 4);
        assert_eq!(times.len(), 4);
        assert_relative_eq!(times[3], 1.5);
    }

    #[test]
    fn diagnostics_cover_every_sample() {
        let scenario = short_scenario();
        let run = run(&scenario).unwrap();
        let diagnostics = run.diagnostics(&scenario).unwrap();

        assert_eq!(diagnostics.len(), run.trajectory.len());
        for (sample, diag) in run.trajectory.iter().zip(&diagnostics) {
            assert_eq!(sample.t, diag.t);
            assert_eq!(sample.wall, diag.wall);
        }
    }

    #[test]
    fn corrections_convert_to_violations() {
        let violation = BoundaryViolation::from(Correction {
            variable: "wall",
            t: 2.0,
            raw: 1.2e23,
            corrected: 1.15e23,
        });
        assert_eq!(violation.variable, "wall");
        assert_eq!(violation.clamped, 1.15e23);
    }
}
