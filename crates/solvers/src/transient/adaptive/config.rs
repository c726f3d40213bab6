use super::Error;

/// Default relative tolerance.
pub const DEFAULT_REL_TOL: f64 = 1e-6;

/// Default absolute tolerance.
pub const DEFAULT_ABS_TOL: f64 = 1e-9;

/// Default budget of attempted internal steps per integration.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Integration method and its error tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// Second-order linearly implicit Rosenbrock method (ROS2).
    ///
    /// L-stable and suited to stiff problems. Uses the problem's analytic
    /// Jacobian when available and finite differences otherwise.
    Rosenbrock { rel_tol: f64, abs_tol: f64 },

    /// Explicit Runge–Kutta method of order 5(4).
    ///
    /// Suitable for non-stiff problems.
    Dopri5 { rel_tol: f64, abs_tol: f64 },

    /// Explicit Runge–Kutta method of order 8(5,3).
    ///
    /// Suitable for non-stiff problems that need high accuracy.
    Dop853 { rel_tol: f64, abs_tol: f64 },
}

impl Method {
    /// Returns `(rel_tol, abs_tol)`.
    pub fn tolerances(&self) -> (f64, f64) {
        match *self {
            Self::Rosenbrock { rel_tol, abs_tol }
            | Self::Dopri5 { rel_tol, abs_tol }
            | Self::Dop853 { rel_tol, abs_tol } => (rel_tol, abs_tol),
        }
    }

    /// Short lowercase name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rosenbrock { .. } => "rosenbrock",
            Self::Dopri5 { .. } => "dopri5",
            Self::Dop853 { .. } => "dop853",
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Rosenbrock {
            rel_tol: DEFAULT_REL_TOL,
            abs_tol: DEFAULT_ABS_TOL,
        }
    }
}

/// Configuration for an adaptive integration.
///
/// Integration starts at the time of the initial state and records a sample
/// every `sample_interval` until `t_end`. The final sample is always exactly
/// `t_end`, even when the span is not a multiple of the interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Final time.
    pub t_end: f64,

    /// Spacing between recorded samples.
    pub sample_interval: f64,

    /// Integration method.
    pub method: Method,

    /// Maximum number of attempted internal steps over the whole integration.
    pub max_steps: u64,
}

impl Config {
    /// Creates a configuration with the default method and step budget.
    pub fn new(t_end: f64, sample_interval: f64) -> Self {
        Self {
            t_end,
            sample_interval,
            method: Method::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Returns this configuration with a different method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Returns this configuration with a different step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Checks that the configuration can drive an integration from `t_start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the span, interval, tolerances, or
    /// step budget are unusable.
    pub fn validate(&self, t_start: f64) -> Result<(), Error> {
        if !t_start.is_finite() || !self.t_end.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "time span must be finite, got [{t_start}, {}]",
                self.t_end
            )));
        }
        if self.t_end < t_start {
            return Err(Error::InvalidConfig(format!(
                "t_end ({}) precedes the initial time ({t_start})",
                self.t_end
            )));
        }
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sample interval must be positive, got {}",
                self.sample_interval
            )));
        }
        let (rel_tol, abs_tol) = self.method.tolerances();
        if !(rel_tol.is_finite() && rel_tol > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "relative tolerance must be positive, got {rel_tol}"
            )));
        }
        if !(abs_tol.is_finite() && abs_tol > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "absolute tolerance must be positive, got {abs_tol}"
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("step budget must be nonzero".into()));
        }
        Ok(())
    }

    /// Sample times after `t_start`, ending exactly at `t_end`.
    ///
    /// Empty when `t_end == t_start`.
    pub fn sample_times(&self, t_start: f64) -> Vec<f64> {
        let mut times = Vec::new();
        if self.t_end <= t_start {
            return times;
        }

        // Absorbs rounding so a span that is a whole number of intervals
        // doesn't produce a sliver segment at the end.
        let slack = 1e-9 * self.sample_interval;
        let mut k: u32 = 1;
        loop {
            let t = t_start + f64::from(k) * self.sample_interval;
            if t >= self.t_end - slack {
                times.push(self.t_end);
                return times;
            }
            times.push(t);
            k += 1;
        }
    }
}
