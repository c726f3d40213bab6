//! Per-sample quantities derived from a finished trajectory.
//!
//! Nothing here feeds back into the integration. The near-unity flag marks
//! samples for display and never changes how a run proceeds.

use crate::{error::ModelError, model::WallRecycling, trajectory::Trajectory};

/// Default `R_eff` above which a sample is flagged as near-unity recycling.
pub const DEFAULT_NEAR_UNITY_THRESHOLD: f64 = 0.995;

/// Fluxes and recycling diagnostics at one sample, in particles/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticSample {
    pub t: f64,
    pub plasma: f64,
    pub wall: f64,
    pub incident_flux: f64,
    pub prompt_return: f64,
    pub release: f64,
    pub return_flux: f64,

    /// Net flux into the wall, `dNw/dt`.
    pub net_wall_flux: f64,

    /// Effective recycling coefficient, `None` without incident flux.
    pub r_eff: Option<f64>,

    /// Whether `r_eff` reaches the near-unity threshold.
    pub near_unity: bool,
}

/// Re-evaluates the closures at every sample of `trajectory`.
///
/// # Errors
///
/// Returns a [`ModelError`] if the closures fail at any sample.
pub fn evaluate(
    model: &WallRecycling,
    trajectory: &Trajectory,
    near_unity_threshold: f64,
) -> Result<Vec<DiagnosticSample>, ModelError> {
    trajectory
        .iter()
        .map(|sample| {
            let fluxes = model.fluxes(sample.t, sample.inventories())?;
            let r_eff = fluxes.effective_recycling();
            Ok(DiagnosticSample {
                t: sample.t,
                plasma: sample.plasma,
                wall: sample.wall,
                incident_flux: fluxes.incident,
                prompt_return: fluxes.prompt_return,
                release: fluxes.release,
                return_flux: fluxes.return_flux(),
                net_wall_flux: fluxes.wall_rate(),
                r_eff,
                near_unity: r_eff.is_some_and(|r| r >= near_unity_threshold),
            })
        })
        .collect()
}
