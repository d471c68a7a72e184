//! Per-run scheduling state shared by the planners.

use crate::SemaphoreTable;

/// The per-run clock/epoch bundle.
///
/// The original design kept these as module-level counters; here they are a
/// value owned by the orchestrator and passed explicitly into planner calls,
/// so two simulations in one process cannot interfere.
///
/// `tick_epoch` is the frame counter that expires reservations: a reservation
/// stamped `tick_epoch + 1` stays live through the next frame and then reads
/// as empty.  Wrap-around after 2³² frames (~1.4 years at 100 Hz) is an
/// accepted limitation.
pub struct NavContext {
    /// Synchronized signal phase table.
    pub semaphores: SemaphoreTable,
    tick_epoch: u32,
}

impl NavContext {
    pub fn new(semaphores: SemaphoreTable) -> Self {
        // Epoch 1 so freshly zeroed reservation slots are already stale.
        Self { semaphores, tick_epoch: 1 }
    }

    /// Advance one frame: tick the signal clock and expire reservations not
    /// re-stamped last frame.  Call exactly once per frame.
    pub fn advance_frame(&mut self, dt: f32) {
        self.semaphores.tick(dt);
        self.tick_epoch = self.tick_epoch.wrapping_add(1);
    }

    /// The current frame epoch.
    #[inline]
    pub fn tick_epoch(&self) -> u32 {
        self.tick_epoch
    }
}

impl Default for NavContext {
    fn default() -> Self {
        Self::new(SemaphoreTable::new())
    }
}
