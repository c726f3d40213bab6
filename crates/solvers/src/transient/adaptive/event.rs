use wallflux_core::{Correction, Snapshot};

/// Event emitted by the adaptive solver for each sample.
///
/// Step 0 is the initial state before any integration.
/// Steps 1..N are emitted after the integrator reaches each sample time.
#[derive(Debug, Clone)]
pub struct Event<I, O> {
    /// The sample number (0 for initial, 1..N for integrated samples).
    pub step: usize,

    /// Snapshot of the model input and output at this sample.
    pub snapshot: Snapshot<I, O>,

    /// Boundary corrections recorded while reaching this sample.
    pub corrections: Vec<Correction>,
}
