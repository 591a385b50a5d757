//! Recording and restart I/O.
//!
//! Recorders observe simulation state at scheduler-driven cadences and
//! append it to a sink; restart snapshots capture enough state to
//! resume a run mid-flight. Both sides are generic over `Write`/`Read`
//! so tests exercise them against in-memory buffers and production
//! code hands them buffered files.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod recorder;
pub mod recorders;
pub mod restart;

pub use error::{RecordError, RestartError};
pub use recorder::{RecordContext, Recorder};
pub use recorders::{BodyStatesRecorder, MechanicalEnergyRecorder, ObservedParticleRecorder};
pub use restart::{read_snapshot, write_snapshot, RestartHeader, RestartIo};
