//! Test utilities and mock types for spume development.
//!
//! Provides probe implementations of the operator, estimator, bracket
//! and recorder seams that log every invocation to a shared
//! [`CallLog`], plus body fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use spume_body::BodyStore;
use spume_core::{BodyId, EstimateError, OperatorError};
use spume_dynamics::{AveragingBracket, Operator, StepEstimator};
use spume_index::NeighborIndex;
use spume_io::{RecordContext, RecordError, Recorder};

/// Shared, thread-safe log of invocations.
///
/// Probes push `"name dt"`-style entries; tests assert on the full
/// ordered sequence to pin down scheduler invocation order.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// All entries in invocation order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries whose label matches `name`, with the label stripped.
    pub fn entries_for(&self, name: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| {
                e.strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix(' '))
                    .map(str::to_owned)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Operator probe: records `"<name> <dt>"` per invocation, touches no
/// particle state.
pub struct ProbeOperator {
    name: String,
    log: CallLog,
}

impl ProbeOperator {
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }
}

impl Operator for ProbeOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        _bodies: &mut BodyStore,
        _index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        self.log.push(format!("{} {dt}", self.name));
        Ok(())
    }
}

/// Operator that always fails, for error-path tests.
pub struct FailingOperator {
    name: String,
}

impl FailingOperator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operator for FailingOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        _bodies: &mut BodyStore,
        _index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        Err(OperatorError::ExecutionFailed {
            reason: "forced failure".into(),
        })
    }
}

/// Estimator returning a fixed bound, logging each query.
pub struct ConstEstimator {
    name: String,
    bound: f64,
    log: CallLog,
}

impl ConstEstimator {
    pub fn new(name: impl Into<String>, bound: f64, log: CallLog) -> Self {
        Self {
            name: name.into(),
            bound,
            log,
        }
    }
}

impl StepEstimator for ConstEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(&self, _bodies: &BodyStore) -> Result<f64, EstimateError> {
        self.log.push(format!("{} {}", self.name, self.bound));
        Ok(self.bound)
    }
}

/// Estimator that reports an instability after a number of successful
/// estimates.
pub struct UnstableEstimator {
    name: String,
    bound: f64,
    remaining_good: Mutex<u64>,
}

impl UnstableEstimator {
    /// Succeeds `good_estimates` times with `bound`, then fails.
    pub fn new(name: impl Into<String>, bound: f64, good_estimates: u64) -> Self {
        Self {
            name: name.into(),
            bound,
            remaining_good: Mutex::new(good_estimates),
        }
    }
}

impl StepEstimator for UnstableEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(&self, _bodies: &BodyStore) -> Result<f64, EstimateError> {
        let mut remaining = self.remaining_good.lock().unwrap();
        if *remaining == 0 {
            Err(EstimateError::NonFiniteVelocity {
                body: BodyId(0),
                particle: 0,
            })
        } else {
            *remaining -= 1;
            Ok(self.bound)
        }
    }
}

/// Bracket probe: records both phases with their arguments.
pub struct ProbeBracket {
    log: CallLog,
}

impl ProbeBracket {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl AveragingBracket for ProbeBracket {
    fn initialize_displacement(&mut self, _bodies: &BodyStore) {
        self.log.push("bracket init");
    }

    fn update_averages(&mut self, _bodies: &mut BodyStore, dt: f64) {
        self.log.push(format!("bracket update {dt}"));
    }
}

/// Recorder probe: records `"<name> t=<time> N=<iteration>"` per
/// sample.
pub struct ProbeRecorder {
    name: String,
    log: CallLog,
}

impl ProbeRecorder {
    pub fn new(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
        }
    }
}

impl Recorder for ProbeRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&mut self, ctx: &RecordContext<'_>) -> Result<(), RecordError> {
        self.log
            .push(format!("{} t={} N={}", self.name, ctx.time, ctx.iteration));
        Ok(())
    }
}
