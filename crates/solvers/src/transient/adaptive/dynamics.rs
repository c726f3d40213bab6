use std::cell::Cell;

use wallflux_core::{Correction, Model, OdeProblem, State};

use super::Error;

/// Right-hand side of an ODE system as seen by an integration backend.
pub(super) trait Rhs<const N: usize> {
    /// Evaluates the time derivative at `(t, y)`.
    fn derivative(&self, t: f64, y: &[f64; N]) -> Result<[f64; N], Error>;

    /// Evaluates the Jacobian at `(t, y)`, if the system provides one.
    fn jacobian(&self, t: f64, y: &[f64; N]) -> Result<Option<[[f64; N]; N]>, Error>;

    /// Moves an accepted state into the admissible region.
    fn constrain(&self, state: &mut State<N>) -> Vec<Correction>;
}

/// Adapts a model and an ODE problem into an [`Rhs`].
///
/// Each evaluation rebuilds model input from `base` and the trial state, so
/// everything in the input that isn't part of the state is held fixed over
/// one sample interval.
pub(super) struct Dynamics<'a, M: Model, P> {
    model: &'a M,
    problem: &'a P,
    base: &'a M::Input,
    evaluations: Cell<u64>,
}

impl<'a, M: Model, P> Dynamics<'a, M, P> {
    pub(super) fn new(model: &'a M, problem: &'a P, base: &'a M::Input) -> Self {
        Self {
            model,
            problem,
            base,
            evaluations: Cell::new(0),
        }
    }

    /// Number of derivative evaluations so far.
    pub(super) fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }

    fn evaluate<const N: usize>(&self, t: f64, y: &[f64; N]) -> Result<(M::Input, M::Output), Error>
    where
        P: OdeProblem<N, Input = M::Input, Output = M::Output>,
    {
        let input = self
            .problem
            .build_input(self.base, &State::new(t, *y))
            .map_err(Error::problem)?;
        let output = self.model.call(&input).map_err(Error::model)?;
        Ok((input, output))
    }
}

impl<M, P, const N: usize> Rhs<N> for Dynamics<'_, M, P>
where
    M: Model,
    P: OdeProblem<N, Input = M::Input, Output = M::Output>,
{
    fn derivative(&self, t: f64, y: &[f64; N]) -> Result<[f64; N], Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        let (input, output) = self.evaluate(t, y)?;
        let derivative = self
            .problem
            .derivative(&input, &output)
            .map_err(Error::problem)?;
        if derivative.iter().all(|v| v.is_finite()) {
            Ok(derivative)
        } else {
            Err(Error::NonFinite { t })
        }
    }

    fn jacobian(&self, t: f64, y: &[f64; N]) -> Result<Option<[[f64; N]; N]>, Error> {
        let (input, output) = self.evaluate(t, y)?;
        self.problem
            .jacobian(&input, &output)
            .map_err(Error::problem)
    }

    fn constrain(&self, state: &mut State<N>) -> Vec<Correction> {
        self.problem.constrain(state)
    }
}
