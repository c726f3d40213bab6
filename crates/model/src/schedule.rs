use std::fmt;

use ndarray::Array1;
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ParameterError};

/// A prescribed function of time, as written in a scenario file.
///
/// Schedules drive the time-dependent inputs of the model: fueling rate,
/// wall temperature, and (optionally) incident flux. Convert one into a
/// [`Forcing`] with [`Forcing::new`] before evaluating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// A constant `value`.
    Constant { value: f64 },

    /// `base · (1 + gain · (1 + tanh((t − center) / width)) / 2)`.
    ///
    /// Rises smoothly from `base` to `base · (1 + gain)` around `center`.
    SmoothStep {
        base: f64,
        gain: f64,
        center: f64,
        width: f64,
    },

    /// `base` before `start`, then `base + amplitude · ((t − start) / duration)^exponent`.
    PowerRamp {
        base: f64,
        start: f64,
        amplitude: f64,
        duration: f64,
        exponent: f64,
    },

    /// Piecewise-linear interpolation through `(t, value)` points.
    ///
    /// Values are held constant outside the tabulated range.
    Table { points: Vec<[f64; 2]> },
}

/// A validated [`Schedule`] ready for evaluation.
pub struct Forcing {
    name: &'static str,
    kind: Kind,
}

enum Kind {
    Constant(f64),
    SmoothStep {
        base: f64,
        gain: f64,
        center: f64,
        width: f64,
    },
    PowerRamp {
        base: f64,
        start: f64,
        amplitude: f64,
        duration: f64,
        exponent: f64,
    },
    Table {
        points: Vec<[f64; 2]>,
        interp: Interp1DOwned<f64, Linear>,
    },
}

impl Forcing {
    /// Validates `schedule` and prepares it for evaluation.
    ///
    /// `name` identifies the schedule in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Schedule`] if any coefficient is non-finite,
    /// a width or duration is not positive, or a table has fewer than two
    /// points or non-increasing times.
    pub fn new(name: &'static str, schedule: &Schedule) -> Result<Self, ParameterError> {
        let invalid = |reason: String| ParameterError::Schedule { name, reason };

        let kind = match schedule {
            Schedule::Constant { value } => {
                check_finite(&[("value", *value)]).map_err(invalid)?;
                Kind::Constant(*value)
            }
            Schedule::SmoothStep {
                base,
                gain,
                center,
                width,
            } => {
                check_finite(&[
                    ("base", *base),
                    ("gain", *gain),
                    ("center", *center),
                    ("width", *width),
                ])
                .map_err(invalid)?;
                if *width <= 0.0 {
                    return Err(invalid(format!("width must be positive, got {width}")));
                }
                Kind::SmoothStep {
                    base: *base,
                    gain: *gain,
                    center: *center,
                    width: *width,
                }
            }
            Schedule::PowerRamp {
                base,
                start,
                amplitude,
                duration,
                exponent,
            } => {
                check_finite(&[
                    ("base", *base),
                    ("start", *start),
                    ("amplitude", *amplitude),
                    ("duration", *duration),
                    ("exponent", *exponent),
                ])
                .map_err(invalid)?;
                if *duration <= 0.0 {
                    return Err(invalid(format!(
                        "duration must be positive, got {duration}"
                    )));
                }
                if *exponent < 0.0 {
                    return Err(invalid(format!(
                        "exponent must be non-negative, got {exponent}"
                    )));
                }
                Kind::PowerRamp {
                    base: *base,
                    start: *start,
                    amplitude: *amplitude,
                    duration: *duration,
                    exponent: *exponent,
                }
            }
            Schedule::Table { points } => {
                if points.len() < 2 {
                    return Err(invalid(format!(
                        "a table needs at least two points, got {}",
                        points.len()
                    )));
                }
                if points.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(invalid("table contains a non-finite value".into()));
                }
                if let Some(w) = points.windows(2).find(|w| w[1][0] <= w[0][0]) {
                    return Err(invalid(format!(
                        "table times must increase, got {} then {}",
                        w[0][0], w[1][0]
                    )));
                }

                let x: Array1<f64> = points.iter().map(|p| p[0]).collect();
                let f_x: Array1<f64> = points.iter().map(|p| p[1]).collect();
                let interp = Interp1DOwned::new(x, f_x, Linear, Extrapolate::Clamp)
                    .map_err(|err| invalid(err.to_string()))?;
                Kind::Table {
                    points: points.clone(),
                    interp,
                }
            }
        };

        Ok(Self { name, kind })
    }

    /// Evaluates the schedule at time `t`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Schedule`] if a table lookup fails, or
    /// [`ModelError::NonFinite`] if the value overflows.
    pub fn value_at(&self, t: f64) -> Result<f64, ModelError> {
        let value = match &self.kind {
            Kind::Constant(value) => *value,
            Kind::SmoothStep {
                base,
                gain,
                center,
                width,
            } => base * (1.0 + gain * (1.0 + ((t - center) / width).tanh()) / 2.0),
            Kind::PowerRamp {
                base,
                start,
                amplitude,
                duration,
                exponent,
            } => {
                if t < *start {
                    *base
                } else {
                    base + amplitude * ((t - start) / duration).powf(*exponent)
                }
            }
            Kind::Table { interp, .. } => {
                interp
                    .interpolate(&[t])
                    .map_err(|err| ModelError::Schedule {
                        name: self.name,
                        t,
                        reason: err.to_string(),
                    })?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite {
                quantity: self.name,
                t,
            })
        }
    }

    /// Smallest value the schedule can take at or after `t_start`.
    ///
    /// Smooth steps and ramps are monotone, and linear tables attain their
    /// extremes at the tabulated points. A decreasing ramp is unbounded below.
    pub fn min_value(&self, t_start: f64) -> f64 {
        match &self.kind {
            Kind::Constant(value) => *value,
            Kind::SmoothStep { base, gain, .. } => base.min(base * (1.0 + gain)),
            Kind::PowerRamp { amplitude, .. } if *amplitude < 0.0 => f64::NEG_INFINITY,
            Kind::PowerRamp { base, .. } => *base,
            Kind::Table { points, .. } => {
                // Value held or interpolated at `t_start`, then every later point.
                let Some(next) = points.iter().position(|p| p[0] > t_start) else {
                    return points[points.len() - 1][1];
                };
                let held = match next {
                    0 => points[0][1],
                    _ => {
                        let [t0, v0] = points[next - 1];
                        let [t1, v1] = points[next];
                        v0 + (v1 - v0) * (t_start - t0) / (t1 - t0)
                    }
                };
                points[next..].iter().map(|p| p[1]).fold(held, f64::min)
            }
        }
    }
}

impl fmt::Debug for Forcing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Forcing");
        out.field("name", &self.name);
        match &self.kind {
            Kind::Constant(value) => out.field("constant", value),
            Kind::SmoothStep {
                base,
                gain,
                center,
                width,
            } => out
                .field("base", base)
                .field("gain", gain)
                .field("center", center)
                .field("width", width),
            Kind::PowerRamp {
                base,
                start,
                amplitude,
                duration,
                exponent,
            } => out
                .field("base", base)
                .field("start", start)
                .field("amplitude", amplitude)
                .field("duration", duration)
                .field("exponent", exponent),
            Kind::Table { points, .. } => out.field("points", points),
        };
        out.finish()
    }
}

fn check_finite(values: &[(&str, f64)]) -> Result<(), String> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((field, value)) => Err(format!("{field} must be finite, got {value}")),
        None => Ok(()),
    }
}
