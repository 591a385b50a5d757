//! Core types for the spume particle simulation engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the strongly-typed identifiers, the simulation clock, and the error
//! taxonomy shared by the rest of the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod error;
pub mod id;

pub use clock::SimulationClock;
pub use error::{EstimateError, OperatorError, StepError};
pub use id::{BodyId, RelationId};
