use std::convert::Infallible;

use uom::si::{frequency::hertz, time::second};
use wallflux_core::{Correction, OdeProblem, State};

use crate::{
    model::{Fluxes, RecyclingInput},
    params::{Exhaust, IncidentFlux, Inventories, Parameters},
};

/// Index of the plasma inventory in the ODE state.
pub const PLASMA: usize = 0;

/// Index of the wall inventory in the ODE state.
pub const WALL: usize = 1;

/// Adapts [`WallRecycling`](crate::WallRecycling) to a two-variable ODE in
/// `(Np, Nw)`, with `Np ≥ 0` and `0 ≤ Nw ≤ Nw_max` as its admissible region.
#[derive(Debug, Clone, Copy)]
pub struct RecyclingProblem<'a> {
    params: &'a Parameters,
}

impl<'a> RecyclingProblem<'a> {
    pub fn new(params: &'a Parameters) -> Self {
        Self { params }
    }
}

impl OdeProblem<2> for RecyclingProblem<'_> {
    type Input = RecyclingInput;
    type Output = Fluxes;
    type Error = Infallible;

    fn state(&self, input: &RecyclingInput) -> Result<State<2>, Infallible> {
        let Inventories { plasma, wall } = input.inventories;
        Ok(State::new(input.time, [plasma, wall]))
    }

    fn derivative(&self, _input: &RecyclingInput, fluxes: &Fluxes) -> Result<[f64; 2], Infallible> {
        Ok([fluxes.plasma_rate(), fluxes.wall_rate()])
    }

    fn build_input(
        &self,
        _base: &RecyclingInput,
        state: &State<2>,
    ) -> Result<RecyclingInput, Infallible> {
        Ok(RecyclingInput {
            time: state.t,
            inventories: Inventories {
                plasma: state.y[PLASMA],
                wall: state.y[WALL],
            },
        })
    }

    fn jacobian(
        &self,
        input: &RecyclingInput,
        fluxes: &Fluxes,
    ) -> Result<Option<[[f64; 2]; 2]>, Infallible> {
        let Inventories { plasma, wall } = input.inventories;
        let capacity = self.params.wall_capacity();
        let recycling = self.params.recycling();

        // Slopes of the clamped closures with respect to their own inventory.
        let incident_slope = match self.params.incident_flux() {
            IncidentFlux::Confinement { confinement_time } if plasma > 0.0 => {
                1.0 / confinement_time.get::<second>()
            }
            _ => 0.0,
        };
        let exhaust_slope = match *self.params.exhaust() {
            Exhaust::Proportional { pump } if plasma > 0.0 => pump.get::<hertz>(),
            _ => 0.0,
        };
        let release_slope = if (0.0..=capacity).contains(&wall) {
            1.0 / fluxes.residence_time
        } else {
            0.0
        };
        let uptake_slope = if (0.0..capacity).contains(&wall) {
            -1.0 / capacity
        } else {
            0.0
        };

        let entering_slope = (1.0 - recycling) * incident_slope;
        Ok(Some([
            [-entering_slope - exhaust_slope, release_slope],
            [
                entering_slope * fluxes.uptake_fraction,
                (1.0 - recycling) * fluxes.incident * uptake_slope - release_slope,
            ],
        ]))
    }

    fn constrain(&self, state: &mut State<2>) -> Vec<Correction> {
        let capacity = self.params.wall_capacity();
        let mut corrections = Vec::new();

        let plasma = state.y[PLASMA];
        if plasma < 0.0 {
            state.y[PLASMA] = 0.0;
            corrections.push(Correction {
                variable: "plasma",
                t: state.t,
                raw: plasma,
                corrected: 0.0,
            });
        }

        let wall = state.y[WALL];
        let clamped = wall.clamp(0.0, capacity);
        if clamped != wall {
            state.y[WALL] = clamped;
            corrections.push(Correction {
                variable: "wall",
                t: state.t,
                raw: wall,
                corrected: clamped,
            });
        }

        corrections
    }
}
