//! Two-stage linearly implicit Rosenbrock method (ROS2).
//!
//! With `γ = 1 + 1/√2`, `W = I − γ·h·J` and `f_t = ∂f/∂t`, each step solves
//!
//! ```text
//! W·k1 = f(t, y) + γ·h·f_t
//! W·k2 = f(t + h, y + h·k1) − 2·k1 − γ·h·f_t
//! y'   = y + 1.5·h·k1 + 0.5·h·k2
//! ```
//!
//! and uses the embedded first-order solution `y + h·k1` for error control.
//! The method is L-stable and second order for any `J`, so an approximate
//! Jacobian only costs efficiency. `f_t` is a forward difference in `t`.

use std::f64::consts::FRAC_1_SQRT_2;

use nalgebra::{DMatrix, DVector};
use wallflux_core::State;

use super::{Error, Segment, Stats, dynamics::Rhs};

const GAMMA: f64 = 1.0 + FRAC_1_SQRT_2;
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Stepper state carried across sample intervals.
#[derive(Debug, Clone)]
pub(super) struct Rosenbrock {
    rel_tol: f64,
    abs_tol: f64,
    max_steps: u64,
    /// Step size proposed by the last accepted step.
    step: Option<f64>,
    /// Cleared once the system reports it has no analytic Jacobian.
    analytic: bool,
}

impl Rosenbrock {
    pub(super) fn new(rel_tol: f64, abs_tol: f64, max_steps: u64) -> Self {
        Self {
            rel_tol,
            abs_tol,
            max_steps,
            step: None,
            analytic: true,
        }
    }

    /// Advances `from` to exactly `target`, constraining every accepted step.
    pub(super) fn advance<R, const N: usize>(
        &mut self,
        rhs: &R,
        from: State<N>,
        target: f64,
        stats: &mut Stats,
    ) -> Result<Segment<N>, Error>
    where
        R: Rhs<N>,
    {
        let mut t = from.t;
        let mut y = DVector::from_row_slice(&from.y);
        let mut corrections = Vec::new();

        let mut h = match self.step {
            Some(h) => h,
            None => self.initial_step(rhs, from, target)?,
        };

        while t < target {
            if stats.attempted_steps() >= self.max_steps {
                return Err(Error::StepBudgetExhausted {
                    t,
                    max_steps: self.max_steps,
                });
            }
            if h <= f64::EPSILON * t.abs().max(1.0) {
                return Err(Error::StepSizeUnderflow { t, h });
            }

            let remaining = target - t;
            let truncated = h >= remaining;
            let step = if truncated { remaining } else { h };

            let y_now = to_array::<N>(&y);
            let f0 = DVector::from_row_slice(&rhs.derivative(t, &y_now)?);
            let jacobian = self.jacobian(rhs, t, &y_now, &f0)?;
            let time_shift = time_derivative(rhs, t, &y_now, &f0)? * (GAMMA * step);
            stats.jacobians += 1;

            let w = DMatrix::<f64>::identity(N, N) - jacobian * (GAMMA * step);
            let lu = w.lu();
            let k1 = lu
                .solve(&(&f0 + &time_shift))
                .ok_or(Error::SingularMatrix { t })?;

            let y_stage = &y + &k1 * step;
            let f1 = DVector::from_row_slice(&rhs.derivative(t + step, &to_array::<N>(&y_stage))?);
            let k2 = lu
                .solve(&(f1 - &k1 * 2.0 - time_shift))
                .ok_or(Error::SingularMatrix { t })?;

            let y_new = &y + &k1 * (1.5 * step) + &k2 * (0.5 * step);
            let error = (&k1 + &k2) * (0.5 * step);
            let norm = self.error_norm(&error, &y, &y_new);
            if !norm.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
                return Err(Error::NonFinite { t: t + step });
            }

            let factor = if norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY / norm.sqrt()).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if norm <= 1.0 {
                stats.accepted_steps += 1;
                t = if truncated { target } else { t + step };

                let mut accepted = State::new(t, to_array::<N>(&y_new));
                corrections.extend(rhs.constrain(&mut accepted));
                y = DVector::from_row_slice(&accepted.y);

                // A step truncated at a sample time keeps the untruncated
                // proposal unless its error asks for a smaller one.
                h = if !truncated || factor < 1.0 {
                    step * factor
                } else {
                    h
                };
            } else {
                stats.rejected_steps += 1;
                h = step * factor;
            }
        }

        self.step = Some(h);
        Ok(Segment {
            state: State::new(target, to_array::<N>(&y)),
            corrections,
        })
    }

    /// Analytic Jacobian when the system has one, finite differences otherwise.
    fn jacobian<R, const N: usize>(
        &mut self,
        rhs: &R,
        t: f64,
        y: &[f64; N],
        f0: &DVector<f64>,
    ) -> Result<DMatrix<f64>, Error>
    where
        R: Rhs<N>,
    {
        if self.analytic {
            if let Some(rows) = rhs.jacobian(t, y)? {
                return Ok(DMatrix::from_fn(N, N, |i, j| rows[i][j]));
            }
            self.analytic = false;
        }

        let mut jacobian = DMatrix::zeros(N, N);
        for j in 0..N {
            let delta = f64::EPSILON.sqrt() * y[j].abs().max(self.abs_tol);
            let mut shifted = *y;
            shifted[j] += delta;
            let f1 = rhs.derivative(t, &shifted)?;
            for i in 0..N {
                jacobian[(i, j)] = (f1[i] - f0[i]) / delta;
            }
        }
        Ok(jacobian)
    }

    /// Starting step from the scaled size of the state and its derivative.
    fn initial_step<R, const N: usize>(
        &self,
        rhs: &R,
        from: State<N>,
        target: f64,
    ) -> Result<f64, Error>
    where
        R: Rhs<N>,
    {
        let f0 = rhs.derivative(from.t, &from.y)?;
        let scale = |v: f64| self.abs_tol + self.rel_tol * v.abs();
        let rms = |values: &[f64; N]| {
            let sum: f64 = values
                .iter()
                .zip(&from.y)
                .map(|(v, y)| (v / scale(*y)).powi(2))
                .sum();
            (sum / N as f64).sqrt()
        };

        let d0 = rms(&from.y);
        let d1 = rms(&f0);
        let h = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        Ok(h.min(target - from.t))
    }

    /// Root-mean-square of the error scaled by the mixed tolerance.
    fn error_norm(&self, error: &DVector<f64>, y: &DVector<f64>, y_new: &DVector<f64>) -> f64 {
        let sum: f64 = error
            .iter()
            .zip(y.iter().zip(y_new.iter()))
            .map(|(e, (a, b))| {
                let scale = self.abs_tol + self.rel_tol * a.abs().max(b.abs());
                (e / scale).powi(2)
            })
            .sum();
        (sum / error.len() as f64).sqrt()
    }
}

/// Forward difference of `f` in `t` at fixed `y`.
fn time_derivative<R, const N: usize>(
    rhs: &R,
    t: f64,
    y: &[f64; N],
    f0: &DVector<f64>,
) -> Result<DVector<f64>, Error>
where
    R: Rhs<N>,
{
    let delta = f64::EPSILON.sqrt() * t.abs().max(1.0);
    let shifted = DVector::from_row_slice(&rhs.derivative(t + delta, y)?);
    Ok((shifted - f0) / delta)
}

fn to_array<const N: usize>(v: &DVector<f64>) -> [f64; N] {
    let mut out = [0.0; N];
    out.copy_from_slice(v.as_slice());
    out
}
