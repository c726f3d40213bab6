/// Boltzmann constant in eV/K (2018 CODATA exact value).
pub const BOLTZMANN_EV_PER_K: f64 = 8.617_333_262_145e-5;
