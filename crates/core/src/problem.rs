/// The state of an ODE system at a given point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State<const N: usize> {
    /// The independent variable (time, in seconds).
    pub t: f64,

    /// The dependent variables at this point.
    ///
    /// The order of values must match the array returned by
    /// [`OdeProblem::derivative`].
    pub y: [f64; N],
}

impl<const N: usize> State<N> {
    /// Creates a state at `t` with values `y`.
    pub fn new(t: f64, y: [f64; N]) -> Self {
        Self { t, y }
    }

    /// Returns `true` if the time and every value are finite.
    pub fn is_finite(&self) -> bool {
        self.t.is_finite() && self.y.iter().all(|v| v.is_finite())
    }
}

/// An adjustment applied to a single variable of an accepted state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Name of the adjusted variable.
    pub variable: &'static str,

    /// Time of the accepted state.
    pub t: f64,

    /// Value produced by the integrator.
    pub raw: f64,

    /// Value after the adjustment.
    pub corrected: f64,
}

impl Correction {
    /// Magnitude of the adjustment.
    pub fn excursion(&self) -> f64 {
        (self.raw - self.corrected).abs()
    }
}

/// Defines an ODE problem with `N` state variables.
///
/// An ODE problem extracts a state from model input, computes derivatives from
/// model input and output, and reconstructs model input from an updated state.
/// This lets a generic integrator advance any [`Model`](crate::Model) whose
/// input carries a fixed-size state.
pub trait OdeProblem<const N: usize> {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extracts the state from model input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the state cannot be extracted from the input.
    fn state(&self, input: &Self::Input) -> Result<State<N>, Self::Error>;

    /// Computes the time derivative of the state from model input and output.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be computed.
    fn derivative(&self, input: &Self::Input, output: &Self::Output)
    -> Result<[f64; N], Self::Error>;

    /// Builds model input from a base input and a new state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the input cannot be constructed from the state.
    fn build_input(&self, base: &Self::Input, state: &State<N>) -> Result<Self::Input, Self::Error>;

    /// Computes the Jacobian of the derivative with respect to the state.
    ///
    /// Entry `[i][j]` is the partial derivative of `derivative[i]` with respect
    /// to `y[j]`. Implicit integrators use it to build their iteration matrix,
    /// and fall back to finite differences when this returns `Ok(None)`.
    ///
    /// The default implementation returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the Jacobian cannot be computed.
    fn jacobian(
        &self,
        _input: &Self::Input,
        _output: &Self::Output,
    ) -> Result<Option<[[f64; N]; N]>, Self::Error> {
        Ok(None)
    }

    /// Constrains an accepted state to the problem's admissible region.
    ///
    /// Called by the integrator after every accepted step. Implementations
    /// move out-of-range values back into range and report each move as a
    /// [`Correction`]; the integrator decides which corrections are worth
    /// recording.
    ///
    /// The default implementation leaves the state unchanged.
    fn constrain(&self, _state: &mut State<N>) -> Vec<Correction> {
        Vec::new()
    }
}
