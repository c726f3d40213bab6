//! Adaptive, error-controlled integration of ODE problems.
//!
//! The integrator advances a model from its initial input to `t_end`, choosing
//! internal step sizes to meet the configured tolerances and recording one
//! snapshot at every sample time. Sample times are never stepped over, so the
//! recorded history is exact at each sample rather than interpolated.
//!
//! Every accepted state is passed through [`OdeProblem::constrain`].
//! Corrections larger than the absolute tolerance are logged, reported to the
//! observer, and returned in [`Solution::violations`].
//!
//! # Methods
//!
//! - [`Method::Rosenbrock`] — linearly implicit, L-stable, for stiff problems
//! - [`Method::Dopri5`] and [`Method::Dop853`] — explicit, for non-stiff problems
//!
//! # Example
//!
//! ```ignore
//! use wallflux_solvers::transient::adaptive::{self, Config};
//!
//! let config = Config::new(180.0, 0.5);
//! let solution = adaptive::solve_unobserved(&model, &problem, initial_input, &config)?;
//!
//! for snapshot in &solution.history {
//!     println!("{:?}: {:?}", snapshot.input, snapshot.output);
//! }
//! ```

mod action;
mod config;
mod dynamics;
mod error;
mod event;
mod explicit;
mod rosenbrock;
mod solution;

pub use action::Action;
pub use config::{Config, DEFAULT_ABS_TOL, DEFAULT_MAX_STEPS, DEFAULT_REL_TOL, Method};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Stats, Status};

use wallflux_core::{Correction, Model, Observer, OdeProblem, Snapshot, State};

use dynamics::Dynamics;
use rosenbrock::Rosenbrock;

/// The state reached at the end of one sample interval.
struct Segment<const N: usize> {
    state: State<N>,
    corrections: Vec<Correction>,
}

/// Integrates an ODE problem with adaptive step-size control.
///
/// # Algorithm
///
/// 1. Extract the initial state, validate the configuration against it, and
///    call the model to get the initial snapshot.
/// 2. For each sample time:
///    - Advance the state to exactly the sample time with the configured
///      method, holding the rest of the current input fixed.
///    - Record corrections whose excursion exceeds the absolute tolerance.
///    - Build the next input from the reached state and call the model.
///    - Emit an [`Event`] to the observer.
///    - If the observer returns `StopEarly`, terminate.
/// 3. Return the solution with the full history.
///
/// # Observer
///
/// The observer receives an [`Event`] for the initial state and after each
/// sample, and may return [`Action::StopEarly`] to terminate early.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the model or problem
/// fails, a non-finite value appears, or the integrator cannot make progress
/// within its step budget.
pub fn solve<M, P, Obs, const N: usize>(
    model: &M,
    problem: &P,
    initial: M::Input,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: Clone,
    M::Output: Clone,
    P: OdeProblem<N, Input = M::Input, Output = M::Output>,
    Obs: Observer<Event<M::Input, M::Output>, Action>,
{
    let start = problem.state(&initial).map_err(Error::problem)?;
    if !start.is_finite() {
        return Err(Error::NonFinite { t: start.t });
    }
    config.validate(start.t)?;

    let samples = config.sample_times(start.t);
    let (_, abs_tol) = config.method.tolerances();

    // Evaluate initial state.
    let initial_output = model.call(&initial).map_err(Error::model)?;
    let initial_snapshot = Snapshot::new(initial, initial_output);

    let mut history = Vec::with_capacity(samples.len() + 1);
    history.push(initial_snapshot.clone());
    let mut violations = Vec::new();
    let mut stats = Stats::default();

    // Emit initial event.
    let event = Event {
        step: 0,
        snapshot: initial_snapshot.clone(),
        corrections: Vec::new(),
    };
    if let Some(Action::StopEarly) = observer.observe(&event) {
        return Ok(Solution {
            status: Status::StoppedByObserver,
            history,
            steps: 0,
            violations,
            stats,
        });
    }

    let mut rosenbrock = match config.method {
        Method::Rosenbrock { rel_tol, abs_tol } => {
            Some(Rosenbrock::new(rel_tol, abs_tol, config.max_steps))
        }
        Method::Dopri5 { .. } | Method::Dop853 { .. } => None,
    };

    let mut current = initial_snapshot;
    let mut state = start;

    for (index, &target) in samples.iter().enumerate() {
        let step = index + 1;

        // Advance to the next sample time.
        let dynamics = Dynamics::new(model, problem, &current.input);
        let segment = match rosenbrock.as_mut() {
            Some(stepper) => stepper.advance(&dynamics, state, target, &mut stats),
            None => explicit::advance(&dynamics, config.method, state, target, &mut stats),
        };
        stats.evaluations += dynamics.evaluations();
        let segment = segment?;

        if stats.attempted_steps() > config.max_steps {
            return Err(Error::StepBudgetExhausted {
                t: target,
                max_steps: config.max_steps,
            });
        }

        let corrections: Vec<Correction> = segment
            .corrections
            .into_iter()
            .filter(|correction| correction.excursion() > abs_tol)
            .collect();
        for correction in &corrections {
            tracing::warn!(
                variable = correction.variable,
                t = correction.t,
                raw = correction.raw,
                corrected = correction.corrected,
                "state left its admissible region"
            );
        }
        violations.extend_from_slice(&corrections);
        state = segment.state;

        // Evaluate model at the sample.
        let next_input = problem
            .build_input(&current.input, &state)
            .map_err(Error::problem)?;
        let next_output = model.call(&next_input).map_err(Error::model)?;
        let next_snapshot = Snapshot::new(next_input, next_output);

        history.push(next_snapshot.clone());

        // Emit event to observer.
        let event = Event {
            step,
            snapshot: next_snapshot.clone(),
            corrections,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            tracing::debug!(t = target, step, "integration stopped by observer");
            return Ok(Solution {
                status: Status::StoppedByObserver,
                history,
                steps: step,
                violations,
                stats,
            });
        }

        current = next_snapshot;
    }

    tracing::debug!(
        method = config.method.name(),
        samples = samples.len(),
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        evaluations = stats.evaluations,
        "integration complete"
    );

    Ok(Solution {
        status: Status::Complete,
        history,
        steps: samples.len(),
        violations,
        stats,
    })
}

/// Integrates an ODE problem with adaptive step-size control, without
/// observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error under the same conditions as [`solve`].
pub fn solve_unobserved<M, P, const N: usize>(
    model: &M,
    problem: &P,
    initial: M::Input,
    config: &Config,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: Clone,
    M::Output: Clone,
    P: OdeProblem<N, Input = M::Input, Output = M::Output>,
{
    solve::<M, P, (), N>(model, problem, initial, config, ())
}
