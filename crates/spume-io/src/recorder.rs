//! The recorder seam between the scheduler and output sinks.

use spume_body::BodyStore;

use crate::error::RecordError;

/// What a recorder sees when the scheduler asks it to sample.
///
/// Recorders are only ever invoked at interval boundaries, so the
/// state they observe is always a consistent full-step configuration,
/// never a half-advanced one.
pub struct RecordContext<'a> {
    /// Physical time of the sample.
    pub time: f64,
    /// Acoustic iteration count at the sample.
    pub iteration: u64,
    /// All bodies, read-only.
    pub bodies: &'a BodyStore,
}

/// An output observer driven by the scheduler's cadences.
pub trait Recorder: Send {
    /// Stable name used in diagnostics.
    fn name(&self) -> &str;

    /// Append one sample to the sink.
    fn record(&mut self, ctx: &RecordContext<'_>) -> Result<(), RecordError>;
}
