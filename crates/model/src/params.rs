use uom::si::{
    energy::electronvolt,
    f64::{Energy, Frequency, ThermodynamicTemperature, Time},
    thermodynamic_temperature::kelvin,
};

use crate::{constants::BOLTZMANN_EV_PER_K, error::ParameterError, schedule::Forcing};

/// Arrhenius closure for the wall residence time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrhenius {
    /// Pre-exponential time scale `τ0`.
    pub prefactor: Time,

    /// Activation energy `Ea`.
    pub activation_energy: Energy,
}

impl Arrhenius {
    /// Residence time `τ(T) = τ0 · exp(Ea / (kB · T))`.
    ///
    /// Overflows to infinity at low enough temperature, which switches
    /// thermal release off.
    pub fn residence_time(&self, temperature: ThermodynamicTemperature) -> Time {
        let exponent = self.activation_energy.get::<electronvolt>()
            / (BOLTZMANN_EV_PER_K * temperature.get::<kelvin>());
        self.prefactor * exponent.exp()
    }
}

/// Closure for the flux of plasma particles striking the wall.
#[derive(Debug)]
pub enum IncidentFlux {
    /// `Γ = Np / τ_p`, with `τ_p` the particle confinement time.
    Confinement { confinement_time: Time },

    /// `Γ` follows a prescribed schedule in particles/s.
    Prescribed(Forcing),
}

/// Closure for particles removed from the plasma by pumping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exhaust {
    /// `pump · Np`.
    Proportional { pump: Frequency },

    /// A fixed sink in particles/s, applied only while plasma remains.
    Constant { rate: f64 },
}

/// Plasma and wall particle inventories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inventories {
    pub plasma: f64,
    pub wall: f64,
}

/// Validated, immutable model parameters.
///
/// Built once at the start of a simulation by [`Parameters::new`], which
/// rejects non-physical values, and read-only afterwards.
#[derive(Debug)]
pub struct Parameters {
    recycling: f64,
    wall_capacity: f64,
    release: Arrhenius,
    fueling: Forcing,
    exhaust: Exhaust,
    incident_flux: IncidentFlux,
    wall_temperature: Forcing,
    initial: Inventories,
}

/// Unvalidated parts of [`Parameters`].
#[derive(Debug)]
pub struct ParameterSet {
    /// Prompt recycling coefficient `R0`, in `[0, 1]`.
    pub recycling: f64,

    /// Wall capacity `Nw_max`, in particles.
    pub wall_capacity: f64,

    pub release: Arrhenius,

    /// Fueling rate in particles/s.
    pub fueling: Forcing,

    pub exhaust: Exhaust,
    pub incident_flux: IncidentFlux,

    /// Wall temperature in kelvin.
    pub wall_temperature: Forcing,

    pub initial: Inventories,
}

impl Parameters {
    /// Validates a parameter set for a run starting at `t_start`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if the wall capacity is not positive, `R0`
    /// lies outside `[0, 1]`, a rate constant or the activation energy is
    /// negative, the wall temperature can drop to zero or below, or the
    /// initial inventories are negative or exceed the wall capacity.
    pub fn new(set: ParameterSet, t_start: f64) -> Result<Self, ParameterError> {
        let ParameterSet {
            recycling,
            wall_capacity,
            release,
            fueling,
            exhaust,
            incident_flux,
            wall_temperature,
            initial,
        } = set;

        positive("wall_capacity", wall_capacity)?;
        finite("recycling", recycling)?;
        if !(0.0..=1.0).contains(&recycling) {
            return Err(ParameterError::OutOfRange {
                name: "recycling",
                value: recycling,
                min: 0.0,
                max: 1.0,
            });
        }

        positive("release.prefactor", release.prefactor.value)?;
        non_negative("release.activation_energy", release.activation_energy.value)?;

        match exhaust {
            Exhaust::Proportional { pump } => non_negative("exhaust.pump", pump.value)?,
            Exhaust::Constant { rate } => non_negative("exhaust.rate", rate)?,
        }

        match &incident_flux {
            IncidentFlux::Confinement { confinement_time } => {
                positive("incident_flux.confinement_time", confinement_time.value)?;
            }
            IncidentFlux::Prescribed(schedule) => {
                non_negative("incident_flux minimum", schedule.min_value(t_start))?;
            }
        }

        non_negative("fueling minimum", fueling.min_value(t_start))?;

        let coldest = wall_temperature.min_value(t_start);
        if coldest.is_nan() || coldest <= 0.0 {
            return Err(ParameterError::NotPositive {
                name: "wall_temperature minimum",
                value: coldest,
            });
        }

        non_negative("initial.plasma", initial.plasma)?;
        non_negative("initial.wall", initial.wall)?;
        if initial.wall > wall_capacity {
            return Err(ParameterError::OutOfRange {
                name: "initial.wall",
                value: initial.wall,
                min: 0.0,
                max: wall_capacity,
            });
        }

        Ok(Self {
            recycling,
            wall_capacity,
            release,
            fueling,
            exhaust,
            incident_flux,
            wall_temperature,
            initial,
        })
    }

    /// Prompt recycling coefficient `R0`.
    pub fn recycling(&self) -> f64 {
        self.recycling
    }

    /// Wall capacity `Nw_max` in particles.
    pub fn wall_capacity(&self) -> f64 {
        self.wall_capacity
    }

    pub fn release(&self) -> &Arrhenius {
        &self.release
    }

    /// Fueling rate schedule in particles/s.
    pub fn fueling(&self) -> &Forcing {
        &self.fueling
    }

    pub fn exhaust(&self) -> &Exhaust {
        &self.exhaust
    }

    pub fn incident_flux(&self) -> &IncidentFlux {
        &self.incident_flux
    }

    /// Wall temperature schedule in kelvin.
    pub fn wall_temperature(&self) -> &Forcing {
        &self.wall_temperature
    }

    pub fn initial(&self) -> Inventories {
        self.initial
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonFinite { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ParameterError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value < 0.0 {
        return Err(ParameterError::Negative { name, value });
    }
    finite(name, value)
}
