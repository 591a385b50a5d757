//! The spume coupling scheduler.
//!
//! Composes estimators, operators, the neighbor index and recorders
//! into the multi-rate nested integration loop: output intervals,
//! advection intervals, acoustic sub-steps, and (for coupled runs) the
//! innermost solid sub-cycle. See [`Scheduler`] for the loop contract
//! and [`SchedulerConfig`] for the knobs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod scheduler;

pub use config::{ConfigError, FluidPhase, SchedulerConfig, SolidCoupling, SolidStepPolicy};
pub use metrics::RunMetrics;
pub use scheduler::{RunError, Scheduler};
