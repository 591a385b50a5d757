//! The simulation clock.
//!
//! [`SimulationClock`] pairs the real-valued physical time with the
//! iteration counter. It is owned by exactly one scheduler instance and
//! mutated only inside the integration loop; operators receive step
//! sizes as arguments and never read the clock directly.

use std::fmt;

/// Monotonically increasing simulation time and iteration count.
///
/// `physical_time` is measured in simulation units, not wall time.
/// Both values only ever increase; [`advance()`](SimulationClock::advance)
/// rejects non-positive and non-finite increments in debug builds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationClock {
    physical_time: f64,
    iteration: u64,
}

impl SimulationClock {
    /// A clock at time zero, iteration zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock seeded from a restart snapshot.
    ///
    /// `physical_time` must be finite and non-negative; the iteration
    /// counter resumes from `iteration`.
    pub fn from_restart(physical_time: f64, iteration: u64) -> Self {
        debug_assert!(
            physical_time.is_finite() && physical_time >= 0.0,
            "restart time must be finite and non-negative, got {physical_time}"
        );
        Self {
            physical_time,
            iteration,
        }
    }

    /// Current physical time in simulation units.
    pub fn physical_time(&self) -> f64 {
        self.physical_time
    }

    /// Number of completed acoustic sub-steps.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Advance physical time by one sub-step.
    pub fn advance(&mut self, dt: f64) {
        debug_assert!(
            dt.is_finite() && dt > 0.0,
            "clock advance must be finite and positive, got {dt}"
        );
        self.physical_time += dt;
    }

    /// Record one completed acoustic sub-step.
    pub fn count_iteration(&mut self) {
        self.iteration += 1;
    }
}

impl fmt::Display for SimulationClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.9} (N={})", self.physical_time, self.iteration)
    }
}
