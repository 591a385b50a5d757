//! The operator seam between physics and scheduling.

use spume_body::BodyStore;
use spume_core::OperatorError;
use spume_index::NeighborIndex;

/// A physics operator invoked by the scheduler.
///
/// Operators mutate particle state in place and never control time:
/// the scheduler decides when each operator runs and which step size it
/// receives. Operators that do not consume a step size (force
/// transfer, normal updates) simply ignore `dt`.
///
/// Implementations may carry accumulation state between invocations
/// (a stress operator keeps its per-particle acceleration between its
/// two half-steps), hence `&mut self`.
pub trait Operator: Send {
    /// Stable name used in error reports and call logs.
    fn name(&self) -> &str;

    /// Advance state by `dt`.
    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError>;
}

/// The two-phase velocity-averaging bracket around a solid sub-cycle.
///
/// `initialize_displacement` is called once immediately before the
/// solid sub-cycle begins and `update_averages` once immediately after
/// it completes, with the full acoustic step the sub-cycle covered.
/// The bracket is how the force-transfer operator sees a solid
/// velocity consistent with the fluid's coarser clock.
pub trait AveragingBracket: Send {
    /// Record the solid's configuration at sub-cycle entry.
    fn initialize_displacement(&mut self, bodies: &BodyStore);

    /// Derive time-averaged velocities over the completed sub-cycle.
    fn update_averages(&mut self, bodies: &mut BodyStore, dt: f64);
}
