//! Scheduler configuration, validation, and error types.
//!
//! [`SchedulerConfig`] is the setup-phase input to
//! [`Scheduler::new`](crate::scheduler::Scheduler::new):
//! intervals, cadences, the relation topology, and the operator chains
//! for each slot of the integration loop. `validate()` checks the
//! structural invariants once at startup so the loop itself never has
//! to.

use std::error::Error;
use std::fmt;

use spume_body::{BodyStore, Relation};
use spume_core::{BodyId, RelationId};
use spume_dynamics::{AveragingBracket, Operator, StepEstimator};
use spume_io::{Recorder, RestartIo};

// ── SolidStepPolicy ────────────────────────────────────────────────

/// How the solid acoustic bound evolves across one solid sub-cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolidStepPolicy {
    /// Re-estimate the bound from current solid state after every
    /// sub-step. Tracks stiffening deformation at the cost of one
    /// estimator pass per sub-step.
    #[default]
    ReEstimate,
    /// Estimate once at sub-cycle entry and reuse the bound for every
    /// sub-step of that cycle.
    Reuse,
}

// ── Phase configurations ───────────────────────────────────────────

/// Operator chains and estimators for the fluid phase.
///
/// The slot lists run in the order given; an empty slot is skipped.
pub struct FluidPhase {
    /// Advection (coarse) bound for the interval length.
    pub advection_estimator: Box<dyn StepEstimator>,
    /// Acoustic (fine) bound for each sub-step.
    pub acoustic_estimator: Box<dyn StepEstimator>,
    /// Run once per advection interval before the bound is estimated
    /// (gravity and viscous initialization, normal updates).
    pub prepare: Vec<Box<dyn Operator>>,
    /// Run once per advection interval after the bound is estimated
    /// (density summation).
    pub update_density: Vec<Box<dyn Operator>>,
    /// Optional velocity smoothing, first slot of each acoustic step.
    pub damping: Vec<Box<dyn Operator>>,
    /// Fluid momentum half-step.
    pub pressure_relaxation: Vec<Box<dyn Operator>>,
    /// Fluid continuity half-step.
    pub density_relaxation: Vec<Box<dyn Operator>>,
}

/// Operator chains, estimator and bracket for a coupled solid.
pub struct SolidCoupling {
    /// Solid acoustic (stress-wave) bound.
    pub acoustic_estimator: Box<dyn StepEstimator>,
    /// Bound re-derivation policy across a sub-cycle.
    pub step_policy: SolidStepPolicy,
    /// Fluid→solid force transfer, run once per acoustic step between
    /// the two fluid half-steps. Receives no meaningful step size.
    pub force_transfer: Vec<Box<dyn Operator>>,
    /// First half of one solid sub-step.
    pub first_half: Vec<Box<dyn Operator>>,
    /// Constraint enforcement between the halves.
    pub constraint: Vec<Box<dyn Operator>>,
    /// Second half of one solid sub-step.
    pub second_half: Vec<Box<dyn Operator>>,
    /// Averaging bracket around the whole sub-cycle.
    pub bracket: Box<dyn AveragingBracket>,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SchedulerConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `end_time` is NaN, infinite, zero, or negative.
    InvalidEndTime {
        /// The invalid value.
        value: f64,
    },
    /// `output_interval` is NaN, infinite, zero, or negative.
    InvalidOutputInterval {
        /// The invalid value.
        value: f64,
    },
    /// An iteration cadence is zero.
    ZeroCadence {
        /// Which cadence field was zero.
        field: &'static str,
    },
    /// The body store is empty.
    NoBodies,
    /// A relation or rebuild-plan entry references an unknown body.
    UnknownBody {
        /// The unknown body.
        body: BodyId,
    },
    /// Two relations share an id.
    DuplicateRelation {
        /// The duplicated id.
        relation: RelationId,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndTime { value } => {
                write!(f, "end_time must be finite and positive, got {value}")
            }
            Self::InvalidOutputInterval { value } => {
                write!(f, "output_interval must be finite and positive, got {value}")
            }
            Self::ZeroCadence { field } => {
                write!(f, "{field} must be at least 1")
            }
            Self::NoBodies => write!(f, "no bodies registered"),
            Self::UnknownBody { body } => {
                write!(f, "configuration references unknown body {body}")
            }
            Self::DuplicateRelation { relation } => {
                write!(f, "relation id {relation} declared twice")
            }
        }
    }
}

impl Error for ConfigError {}

// ── SchedulerConfig ────────────────────────────────────────────────

/// Complete configuration for one scheduler run.
pub struct SchedulerConfig {
    /// Simulation end time.
    pub end_time: f64,
    /// Output interval: recorder cadence and the outer loop's span.
    pub output_interval: f64,
    /// Console diagnostics every this many acoustic iterations.
    pub screen_output_interval: u64,
    /// Observation recorders run every this many acoustic iterations.
    pub observation_sample_interval: u64,
    /// Restart snapshots every this many acoustic iterations.
    pub restart_output_interval: u64,
    /// All declared relations; rebuilt by the scheduler, read by
    /// operators.
    pub relations: Vec<(RelationId, Relation)>,
    /// Bodies whose positions change during the run; their cell grids
    /// are refreshed after every advection interval.
    pub moving_bodies: Vec<BodyId>,
    /// Fluid phase.
    pub fluid: FluidPhase,
    /// Optional coupled solid phase.
    pub solid: Option<SolidCoupling>,
    /// Recorders invoked once per output interval.
    pub output_recorders: Vec<Box<dyn Recorder>>,
    /// Recorders invoked at the observation cadence.
    pub observation_recorders: Vec<Box<dyn Recorder>>,
    /// Restart snapshot storage; `None` disables restart writes.
    pub restart: Option<RestartIo>,
}

impl SchedulerConfig {
    /// Validate structural invariants against the configured bodies.
    pub fn validate(&self, bodies: &BodyStore) -> Result<(), ConfigError> {
        if !self.end_time.is_finite() || self.end_time <= 0.0 {
            return Err(ConfigError::InvalidEndTime {
                value: self.end_time,
            });
        }
        if !self.output_interval.is_finite() || self.output_interval <= 0.0 {
            return Err(ConfigError::InvalidOutputInterval {
                value: self.output_interval,
            });
        }
        for (value, field) in [
            (self.screen_output_interval, "screen_output_interval"),
            (
                self.observation_sample_interval,
                "observation_sample_interval",
            ),
            (self.restart_output_interval, "restart_output_interval"),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCadence { field });
            }
        }
        if bodies.is_empty() {
            return Err(ConfigError::NoBodies);
        }

        let mut seen = Vec::new();
        for (id, relation) in &self.relations {
            if seen.contains(id) {
                return Err(ConfigError::DuplicateRelation { relation: *id });
            }
            seen.push(*id);
            for body in relation.referenced_bodies() {
                if bodies.get(body).is_none() {
                    return Err(ConfigError::UnknownBody { body });
                }
            }
        }
        for &body in &self.moving_bodies {
            if bodies.get(body).is_none() {
                return Err(ConfigError::UnknownBody { body });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("end_time", &self.end_time)
            .field("output_interval", &self.output_interval)
            .field("screen_output_interval", &self.screen_output_interval)
            .field(
                "observation_sample_interval",
                &self.observation_sample_interval,
            )
            .field("restart_output_interval", &self.restart_output_interval)
            .field("relations", &self.relations.len())
            .field("moving_bodies", &self.moving_bodies)
            .field("coupled", &self.solid.is_some())
            .field("output_recorders", &self.output_recorders.len())
            .field("observation_recorders", &self.observation_recorders.len())
            .finish()
    }
}
