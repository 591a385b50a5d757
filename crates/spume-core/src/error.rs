//! Error types for the spume simulation engine.
//!
//! Organized by subsystem: step-size estimation, operator execution,
//! and the integration loop. Instability is always fatal — a corrupted
//! step-size bound cannot be clamped away without masking a real
//! divergence, so estimators surface it as an error and the scheduler
//! terminates the run.

use std::error::Error;
use std::fmt;

use crate::id::BodyId;

/// Errors from step-size estimation.
///
/// An estimator that observes non-physical particle state must refuse
/// to produce a bound. The scheduler treats any of these as fatal.
#[derive(Clone, Debug, PartialEq)]
pub enum EstimateError {
    /// A particle's density is zero or negative.
    NonPositiveDensity {
        /// The body containing the particle.
        body: BodyId,
        /// Index of the offending particle.
        particle: usize,
        /// The observed density value.
        value: f64,
    },
    /// A particle's velocity contains NaN or infinity.
    NonFiniteVelocity {
        /// The body containing the particle.
        body: BodyId,
        /// Index of the offending particle.
        particle: usize,
    },
    /// The estimator's target body does not exist in the store.
    MissingBody {
        /// The missing body.
        body: BodyId,
    },
    /// The computed bound itself is not a usable step size.
    ///
    /// Guards against degenerate configuration (zero smoothing length,
    /// zero sound speed) producing a zero or non-finite bound.
    NonPositiveBound {
        /// The body the bound was computed for.
        body: BodyId,
        /// The invalid bound value.
        value: f64,
    },
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveDensity {
                body,
                particle,
                value,
            } => {
                write!(
                    f,
                    "body {body} particle {particle} has non-positive density {value}"
                )
            }
            Self::NonFiniteVelocity { body, particle } => {
                write!(f, "body {body} particle {particle} has non-finite velocity")
            }
            Self::MissingBody { body } => {
                write!(f, "estimator target body {body} not found in store")
            }
            Self::NonPositiveBound { body, value } => {
                write!(
                    f,
                    "step bound for body {body} must be finite and positive, got {value}"
                )
            }
        }
    }
}

impl Error for EstimateError {}

/// Errors from individual operator execution.
///
/// Returned by `Operator::execute()` and wrapped in
/// [`StepError::OperatorFailed`] by the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub enum OperatorError {
    /// The operator's execute function failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The operator was invoked against a relation with no neighbor
    /// lists built for it.
    MissingRelation {
        /// The relation the operator expected.
        relation: crate::id::RelationId,
    },
    /// The operator was invoked against a body that does not exist.
    MissingBody {
        /// The body the operator expected.
        body: BodyId,
    },
}

impl fmt::Display for OperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::MissingRelation { relation } => {
                write!(f, "relation {relation} has no neighbor lists")
            }
            Self::MissingBody { body } => write!(f, "body {body} not found"),
        }
    }
}

impl Error for OperatorError {}

/// Errors from the integration loop.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// A step-size estimator detected non-physical state.
    ///
    /// Fatal: the run cannot safely continue with a corrupted bound.
    Instability {
        /// Name of the estimator that detected the instability.
        estimator: String,
        /// The underlying estimate error.
        reason: EstimateError,
    },
    /// An operator returned an error during execution.
    OperatorFailed {
        /// Name of the failing operator.
        name: String,
        /// The underlying operator error.
        reason: OperatorError,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instability { estimator, reason } => {
                write!(f, "estimator '{estimator}' detected instability: {reason}")
            }
            Self::OperatorFailed { name, reason } => {
                write!(f, "operator '{name}' failed: {reason}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Instability { reason, .. } => Some(reason),
            Self::OperatorFailed { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_error_display() {
        let err = EstimateError::NonPositiveDensity {
            body: BodyId(0),
            particle: 17,
            value: -1.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("particle 17"));
        assert!(msg.contains("-1.5"));
    }

    #[test]
    fn step_error_sources_chain() {
        let err = StepError::Instability {
            estimator: "fluid_acoustic".to_string(),
            reason: EstimateError::NonFiniteVelocity {
                body: BodyId(1),
                particle: 3,
            },
        };
        assert!(err.source().is_some());
        let msg = format!("{err}");
        assert!(msg.contains("fluid_acoustic"));
        assert!(msg.contains("non-finite velocity"));
    }

    #[test]
    fn operator_error_display() {
        let err = OperatorError::MissingRelation {
            relation: crate::id::RelationId(2),
        };
        assert_eq!(format!("{err}"), "relation 2 has no neighbor lists");
    }
}
