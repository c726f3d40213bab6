use uom::si::{
    f64::ThermodynamicTemperature, frequency::hertz, thermodynamic_temperature::kelvin,
    time::second,
};
use wallflux_core::Model;

use crate::{
    error::ModelError,
    params::{Exhaust, IncidentFlux, Inventories, Parameters},
};

/// Time and inventories at which the closures are evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecyclingInput {
    /// Time in seconds.
    pub time: f64,
    pub inventories: Inventories,
}

/// Particle fluxes at one time and state, in particles/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fluxes {
    /// External fueling into the plasma.
    pub fueling: f64,

    /// Plasma particles striking the wall, `Γ`.
    pub incident: f64,

    /// Part of the incident flux returned at once, `R0 · Γ`.
    pub prompt_return: f64,

    /// Part of the wall-entering flux `(1 − R0) · Γ` the wall takes up.
    pub absorbed: f64,

    /// Part of the wall-entering flux a full wall cannot take up.
    ///
    /// This leaves the system, so it is the only loss besides exhaust.
    pub unabsorbed: f64,

    /// Thermally activated release from the wall, `Nw / τ(T)`.
    pub release: f64,

    /// Pumped exhaust from the plasma.
    pub exhaust: f64,

    /// Fraction of the wall capacity still free, `clamp(1 − Nw / Nw_max, 0, 1)`.
    pub uptake_fraction: f64,

    /// Wall temperature in kelvin.
    pub wall_temperature: f64,

    /// Arrhenius residence time in seconds.
    pub residence_time: f64,
}

impl Fluxes {
    /// Rate of change of the plasma inventory, `dNp/dt`.
    pub fn plasma_rate(&self) -> f64 {
        self.fueling + self.prompt_return + self.release - self.incident - self.exhaust
    }

    /// Rate of change of the wall inventory, `dNw/dt`.
    pub fn wall_rate(&self) -> f64 {
        self.absorbed - self.release
    }

    /// Particles returned to the plasma, promptly or by release.
    pub fn return_flux(&self) -> f64 {
        self.prompt_return + self.release
    }

    /// Effective recycling coefficient, `return flux / incident flux`.
    ///
    /// `None` when nothing strikes the wall.
    pub fn effective_recycling(&self) -> Option<f64> {
        (self.incident > 0.0).then(|| self.return_flux() / self.incident)
    }
}

/// The zero-dimensional wall recycling model.
///
/// Calling the model evaluates every closure at the admissible state
/// `max(Np, 0)`, `clamp(Nw, 0, Nw_max)`.
#[derive(Debug)]
pub struct WallRecycling {
    params: Parameters,
}

impl WallRecycling {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Evaluates the flux closures at time `t` and the given inventories.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if an inventory or schedule is non-finite, or
    /// the wall temperature is not positive.
    pub fn fluxes(&self, t: f64, inventories: Inventories) -> Result<Fluxes, ModelError> {
        let params = &self.params;
        let capacity = params.wall_capacity();

        require_finite("plasma inventory", inventories.plasma, t)?;
        require_finite("wall inventory", inventories.wall, t)?;
        let plasma = inventories.plasma.max(0.0);
        let wall = inventories.wall.clamp(0.0, capacity);

        let wall_temperature = params.wall_temperature().value_at(t)?;
        if wall_temperature <= 0.0 {
            return Err(ModelError::NonPositiveTemperature {
                t,
                kelvin: wall_temperature,
            });
        }
        let residence_time = params
            .release()
            .residence_time(ThermodynamicTemperature::new::<kelvin>(wall_temperature))
            .get::<second>();
        let release = wall / residence_time;

        let incident = match params.incident_flux() {
            IncidentFlux::Confinement { confinement_time } => {
                plasma / confinement_time.get::<second>()
            }
            IncidentFlux::Prescribed(schedule) => schedule.value_at(t)?,
        };

        let recycling = params.recycling();
        let entering = (1.0 - recycling) * incident;
        let uptake_fraction = (1.0 - wall / capacity).clamp(0.0, 1.0);
        let absorbed = entering * uptake_fraction;

        let exhaust = match *params.exhaust() {
            Exhaust::Proportional { pump } => pump.get::<hertz>() * plasma,
            Exhaust::Constant { rate } if plasma > 0.0 => rate,
            Exhaust::Constant { .. } => 0.0,
        };

        let fluxes = Fluxes {
            fueling: params.fueling().value_at(t)?,
            incident,
            prompt_return: recycling * incident,
            absorbed,
            unabsorbed: entering - absorbed,
            release,
            exhaust,
            uptake_fraction,
            wall_temperature,
            residence_time,
        };

        require_finite("incident flux", fluxes.incident, t)?;
        require_finite("thermal release", fluxes.release, t)?;
        require_finite("exhaust", fluxes.exhaust, t)?;
        Ok(fluxes)
    }
}

impl Model for WallRecycling {
    type Input = RecyclingInput;
    type Output = Fluxes;
    type Error = ModelError;

    fn call(&self, input: &RecyclingInput) -> Result<Fluxes, ModelError> {
        self.fluxes(input.time, input.inventories)
    }
}

fn require_finite(quantity: &'static str, value: f64, t: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonFinite { quantity, t })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{config::ScenarioConfig, schedule::Schedule};

    fn reference_at_constant_temperature() -> WallRecycling {
        let mut config = ScenarioConfig::reference();
        config.wall_temperature = Schedule::Constant { value: 573.0 };
        config.build().unwrap().model
    }

    #[test]
    fn closures_match_reference_formulas() {
        let model = reference_at_constant_temperature();
        let inventories = Inventories {
            plasma: 1.8e21,
            wall: 3.2e22,
        };

        let fluxes = model.fluxes(0.0, inventories).unwrap();

        let incident = 1.8e21 / 3.5;
        assert_relative_eq!(fluxes.incident, incident);
        assert_relative_eq!(fluxes.prompt_return, 0.992 * incident);
        let uptake = 1.0 - 3.2e22 / 1.15e23;
        assert_relative_eq!(fluxes.uptake_fraction, uptake);
        assert_relative_eq!(fluxes.absorbed, 0.008 * incident * uptake, max_relative = 1e-12);
        assert_relative_eq!(fluxes.release, 3.2e22 / fluxes.residence_time);
        assert_relative_eq!(fluxes.exhaust, 5.6e-4 * 1.8e21);

        let fueling = 1.2e22 * (1.0 + 1.8 * (1.0 + (-15.0_f64 / 4.0).tanh()) / 2.0);
        assert_relative_eq!(fluxes.fueling, fueling);
    }

    #[test]
    fn rates_balance_against_explicit_losses() {
        let model = reference_at_constant_temperature();
        let fluxes = model
            .fluxes(
                30.0,
                Inventories {
                    plasma: 5.0e21,
                    wall: 1.0e23,
                },
            )
            .unwrap();

        let total = fluxes.plasma_rate() + fluxes.wall_rate();
        let expected = fluxes.fueling - fluxes.exhaust - fluxes.unabsorbed;
        assert_relative_eq!(total, expected, max_relative = 1e-9);
    }

    #[test]
    fn closures_see_admissible_state() {
        let model = reference_at_constant_temperature();

        let below = model
            .fluxes(
                0.0,
                Inventories {
                    plasma: -1.0e20,
                    wall: -5.0e20,
                },
            )
            .unwrap();
        assert_eq!(below.incident, 0.0);
        assert_eq!(below.release, 0.0);
        assert_eq!(below.uptake_fraction, 1.0);

        let above = model
            .fluxes(
                0.0,
                Inventories {
                    plasma: 1.0e21,
                    wall: 2.0e23,
                },
            )
            .unwrap();
        assert_eq!(above.uptake_fraction, 0.0);
        assert_eq!(above.absorbed, 0.0);
        assert_relative_eq!(above.release, 1.15e23 / above.residence_time);
    }

    #[test]
    fn effective_recycling_is_undefined_without_incident_flux() {
        let model = reference_at_constant_temperature();
        let fluxes = model
            .fluxes(
                0.0,
                Inventories {
                    plasma: 0.0,
                    wall: 1.0e22,
                },
            )
            .unwrap();
        assert!(fluxes.effective_recycling().is_none());
    }

    #[test]
    fn non_finite_inventories_are_rejected() {
        let model = reference_at_constant_temperature();
        let result = model.fluxes(
            1.0,
            Inventories {
                plasma: f64::NAN,
                wall: 0.0,
            },
        );
        assert!(matches!(
            result,
            Err(ModelError::NonFinite {
                quantity: "plasma inventory",
                ..
            })
        ));
    }
}
