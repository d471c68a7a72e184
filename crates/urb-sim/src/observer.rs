//! Step observer hooks for progress reporting and data collection.

use crate::sim::StepOutputs;

/// Callbacks invoked around each simulation step.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait SimObserver {
    /// Called before a frame is processed.
    fn on_step_start(&mut self, _frame: u64) {}

    /// Called after a frame, with the outputs published to the host.
    fn on_step_end(&mut self, _frame: u64, _outputs: &StepOutputs) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
