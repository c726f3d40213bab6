//! Explicit Dormand–Prince backends from `ode_solvers`.
//!
//! The explicit steppers integrate one sample interval at a time. They cannot
//! modify the state between internal steps, so overshoots past the admissible
//! region are recorded at every accepted step and the state is constrained at
//! each sample time.
//!
//! The steppers' stiffness heuristic is disabled. It misfires on right-hand
//! sides with kinks, such as clamped wall uptake at capacity, and a genuinely
//! stiff run still ends at the step budget.

use std::cell::RefCell;

use ode_solvers::{Dop853, Dopri5, SVector, System, dop_shared::OutputType};
use wallflux_core::{Correction, State};

use super::{Error, Method, Segment, Stats, dynamics::Rhs};

/// Never reached, so stiffness is never tested.
const NO_STIFFNESS_TEST: u32 = u32::MAX;

/// Default internal step limit of both `ode_solvers` steppers.
const MAX_INTERNAL_STEPS: u32 = 100_000;

/// What `solout` saw during one sample interval.
struct Trace<const N: usize> {
    last: Option<State<N>>,
    overshoots: Vec<Correction>,
    non_finite: Option<f64>,
}

/// Adapts an [`Rhs`] into an `ode_solvers` system.
struct ExplicitSystem<'a, R, const N: usize> {
    rhs: &'a R,
    error: &'a RefCell<Option<Error>>,
    trace: &'a RefCell<Trace<N>>,
}

impl<R: Rhs<N>, const N: usize> System<f64, SVector<f64, N>> for ExplicitSystem<'_, R, N> {
    fn system(&self, x: f64, y: &SVector<f64, N>, dy: &mut SVector<f64, N>) {
        let y: [f64; N] = (*y).into();
        match self.rhs.derivative(x, &y) {
            Ok(derivative) => *dy = SVector::from_row_slice(&derivative),
            Err(err) => {
                let mut slot = self.error.borrow_mut();
                if slot.is_none() {
                    *slot = Some(err);
                }
                *dy = SVector::from_element(f64::NAN);
            }
        }
    }

    fn solout(&mut self, x: f64, y: &SVector<f64, N>, _dy: &SVector<f64, N>) -> bool {
        // Stop integration early if a model call failed.
        if self.error.borrow().is_some() {
            return true;
        }

        let state = State::new(x, (*y).into());
        let mut trace = self.trace.borrow_mut();
        if !state.is_finite() {
            trace.non_finite = Some(x);
            return true;
        }

        let mut clamped = state;
        let overshoots = self.rhs.constrain(&mut clamped);
        trace.overshoots.extend(overshoots);
        trace.last = Some(state);
        false
    }
}

/// Advances `from` to `target` with [`Method::Dopri5`] or [`Method::Dop853`].
pub(super) fn advance<R, const N: usize>(
    rhs: &R,
    method: Method,
    from: State<N>,
    target: f64,
    stats: &mut Stats,
) -> Result<Segment<N>, Error>
where
    R: Rhs<N>,
{
    let error = RefCell::new(None);
    let trace = RefCell::new(Trace {
        last: None,
        overshoots: Vec::new(),
        non_finite: None,
    });
    let system = ExplicitSystem {
        rhs,
        error: &error,
        trace: &trace,
    };

    let y_start: SVector<f64, N> = from.y.into();
    let span = target - from.t;

    // Sparse output records every accepted step, which `solout` then sees.
    // Controller settings are each stepper's defaults.
    let (result, x_out, y_out) = match method {
        Method::Dopri5 { rel_tol, abs_tol } => {
            let mut stepper = Dopri5::from_param(
                system,
                from.t,
                target,
                span,
                y_start,
                rel_tol,
                abs_tol,
                0.9,
                0.04,
                0.2,
                10.0,
                span,
                0.0,
                MAX_INTERNAL_STEPS,
                NO_STIFFNESS_TEST,
                OutputType::Sparse,
            );
            let result = stepper.integrate();
            (result, stepper.x_out().clone(), stepper.y_out().clone())
        }
        Method::Dop853 { rel_tol, abs_tol } => {
            let mut stepper = Dop853::from_param(
                system,
                from.t,
                target,
                span,
                y_start,
                rel_tol,
                abs_tol,
                0.9,
                0.0,
                0.333,
                6.0,
                span,
                0.0,
                MAX_INTERNAL_STEPS,
                NO_STIFFNESS_TEST,
                OutputType::Sparse,
            );
            let result = stepper.integrate();
            (result, stepper.x_out().clone(), stepper.y_out().clone())
        }
        Method::Rosenbrock { .. } => {
            return Err(Error::InvalidConfig(
                "the explicit backend cannot run a Rosenbrock method".into(),
            ));
        }
    };

    if let Some(err) = error.borrow_mut().take() {
        return Err(err);
    }

    let trace = trace.into_inner();
    if let Some(t) = trace.non_finite {
        return Err(Error::NonFinite { t });
    }

    let integration = result.map_err(Error::Integration)?;
    stats.accepted_steps += u64::from(integration.accepted_steps);
    stats.rejected_steps += u64::from(integration.rejected_steps);

    let reached = |t: f64| (t - target).abs() <= 1e-9 * target.abs().max(1.0);
    let mut corrections = trace.overshoots;
    let last = match trace.last {
        Some(state) if reached(state.t) => state,
        _ => {
            let fallback = x_out
                .last()
                .zip(y_out.last())
                .map(|(&t, y)| State::new(t, (*y).into()));
            match fallback {
                Some(state) if reached(state.t) && state.is_finite() => {
                    let mut clamped = state;
                    corrections.extend(rhs.constrain(&mut clamped));
                    state
                }
                Some(state) => {
                    return Err(Error::IncompleteSegment {
                        reached: state.t,
                        target,
                    });
                }
                None => {
                    return Err(Error::IncompleteSegment {
                        reached: from.t,
                        target,
                    });
                }
            }
        }
    };

    let mut state = State::new(target, last.y);
    rhs.constrain(&mut state);
    Ok(Segment { state, corrections })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    /// Exponential decay `y' = -k·y` that can fail past a given time.
    struct Decay {
        rate: f64,
        fail_after: Option<f64>,
    }

    impl Rhs<1> for Decay {
        fn derivative(&self, t: f64, y: &[f64; 1]) -> Result<[f64; 1], Error> {
            match self.fail_after {
                Some(limit) if t > limit => Err(Error::NonFinite { t }),
                _ => Ok([-self.rate * y[0]]),
            }
        }

        fn jacobian(&self, _t: f64, _y: &[f64; 1]) -> Result<Option<[[f64; 1]; 1]>, Error> {
            Ok(None)
        }

        fn constrain(&self, _state: &mut State<1>) -> Vec<Correction> {
            Vec::new()
        }
    }

    /// Constant drain `y' = -1` that is clamped at zero.
    struct Drain;

    impl Rhs<1> for Drain {
        fn derivative(&self, _t: f64, _y: &[f64; 1]) -> Result<[f64; 1], Error> {
            Ok([-1.0])
        }

        fn jacobian(&self, _t: f64, _y: &[f64; 1]) -> Result<Option<[[f64; 1]; 1]>, Error> {
            Ok(None)
        }

        fn constrain(&self, state: &mut State<1>) -> Vec<Correction> {
            if state.y[0] >= 0.0 {
                return Vec::new();
            }
            let raw = state.y[0];
            state.y[0] = 0.0;
            vec![Correction {
                variable: "y",
                t: state.t,
                raw,
                corrected: 0.0,
            }]
        }
    }

    #[test]
    fn overshoots_are_recorded_at_internal_steps() {
        for method in [
            Method::Dopri5 {
                rel_tol: 1e-6,
                abs_tol: 1e-9,
            },
            Method::Dop853 {
                rel_tol: 1e-6,
                abs_tol: 1e-9,
            },
        ] {
            let mut stats = Stats::default();
            let segment = advance(&Drain, method, State::new(0.0, [1.0]), 100.0, &mut stats).unwrap();

            assert_eq!(segment.state.y[0], 0.0);
            assert!(
                segment.corrections.iter().any(|c| c.t < 100.0 && c.raw < 0.0),
                "{:?}",
                segment.corrections
            );
            assert!(segment.corrections.iter().all(|c| c.corrected == 0.0));
        }
    }

    #[test]
    fn dopri5_reaches_sample_time_accurately() {
        let rhs = Decay {
            rate: 0.5,
            fail_after: None,
        };
        let method = Method::Dopri5 {
            rel_tol: 1e-10,
            abs_tol: 1e-12,
        };
        let mut stats = Stats::default();

        let segment = advance(&rhs, method, State::new(0.0, [2.0]), 2.0, &mut stats).unwrap();

        assert_eq!(segment.state.t, 2.0);
        assert_relative_eq!(segment.state.y[0], 2.0 * (-1.0_f64).exp(), epsilon = 1e-8);
        assert!(stats.accepted_steps > 0);
        assert!(segment.corrections.is_empty());
    }

    #[test]
    fn dop853_matches_dopri5() {
        let rhs = Decay {
            rate: 1.5,
            fail_after: None,
        };
        let from = State::new(1.0, [1.0]);
        let mut stats = Stats::default();

        let a = advance(
            &rhs,
            Method::Dopri5 {
                rel_tol: 1e-10,
                abs_tol: 1e-12,
            },
            from,
            1.5,
            &mut stats,
        )
        .unwrap();
        let b = advance(
            &rhs,
            Method::Dop853 {
                rel_tol: 1e-10,
                abs_tol: 1e-12,
            },
            from,
            1.5,
            &mut stats,
        )
        .unwrap();

        assert_relative_eq!(a.state.y[0], b.state.y[0], epsilon = 1e-8);
        assert_relative_eq!(b.state.y[0], (-0.75_f64).exp(), epsilon = 1e-8);
    }

    #[test]
    fn rhs_errors_abort_the_interval() {
        let rhs = Decay {
            rate: 1.0,
            fail_after: Some(0.3),
        };
        let mut stats = Stats::default();

        let result = advance(
            &rhs,
            Method::Dopri5 {
                rel_tol: 1e-6,
                abs_tol: 1e-9,
            },
            State::new(0.0, [1.0]),
            1.0,
            &mut stats,
        );

        assert!(matches!(result, Err(Error::NonFinite { .. })));
    }
}
