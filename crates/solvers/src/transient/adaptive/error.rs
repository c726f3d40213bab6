use std::error::Error as StdError;

use ode_solvers::dop_shared::IntegrationError;

/// Errors that can occur during adaptive integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("model error: {0}")]
    Model(#[source] Box<dyn StdError + Send + Sync>),

    #[error("problem error: {0}")]
    Problem(#[source] Box<dyn StdError + Send + Sync>),

    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("non-finite state or derivative at t = {t}")]
    NonFinite { t: f64 },

    #[error("step size underflow at t = {t} (h = {h:e})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("step budget of {max_steps} exhausted at t = {t}")]
    StepBudgetExhausted { t: f64, max_steps: u64 },

    #[error("singular iteration matrix at t = {t}")]
    SingularMatrix { t: f64 },

    #[error("explicit integration failed: {0:?}")]
    Integration(IntegrationError),

    #[error("integration stopped at t = {reached} before reaching t = {target}")]
    IncompleteSegment { reached: f64, target: f64 },
}

impl Error {
    pub(crate) fn model<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Model(Box::new(err))
    }

    pub(crate) fn problem<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Problem(Box::new(err))
    }
}
