//! Run accounting for the integration loop.

/// Counters and last-seen step sizes collected over one run.
///
/// The scheduler populates these as it goes; tests and diagnostics
/// read them after `run()` returns. All counters are cumulative over
/// the scheduler's lifetime, so a resumed run keeps counting where the
/// restored iteration left off.
#[derive(Clone, Debug, Default)]
pub struct RunMetrics {
    /// Completed output intervals.
    pub output_intervals: u64,
    /// Completed advection intervals.
    pub advection_intervals: u64,
    /// Acoustic sub-steps taken.
    pub acoustic_steps: u64,
    /// Solid sub-steps taken (zero for a pure-fluid run).
    pub solid_substeps: u64,
    /// Neighbor index refreshes (including the initial build).
    pub index_rebuilds: u64,
    /// Output-interval recorder invocations.
    pub output_records: u64,
    /// Observation-cadence recorder invocations.
    pub observation_records: u64,
    /// Restart snapshots written.
    pub restart_writes: u64,
    /// Most recent advection interval length.
    pub last_advection_dt: f64,
    /// Most recent acoustic sub-step size.
    pub last_acoustic_dt: f64,
    /// Most recent solid sub-step size (0.0 until a solid stepped).
    pub last_solid_dt: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = RunMetrics::default();
        assert_eq!(m.output_intervals, 0);
        assert_eq!(m.advection_intervals, 0);
        assert_eq!(m.acoustic_steps, 0);
        assert_eq!(m.solid_substeps, 0);
        assert_eq!(m.index_rebuilds, 0);
        assert_eq!(m.output_records, 0);
        assert_eq!(m.observation_records, 0);
        assert_eq!(m.restart_writes, 0);
        assert_eq!(m.last_advection_dt, 0.0);
        assert_eq!(m.last_acoustic_dt, 0.0);
        assert_eq!(m.last_solid_dt, 0.0);
    }
}
