//! Error types for recording and restart I/O.

use std::fmt;
use std::io;

use spume_core::BodyId;

/// Errors that can occur while a recorder writes a sample.
#[derive(Debug)]
pub enum RecordError {
    /// An I/O error occurred on the sink.
    Io(io::Error),
    /// The recorder's target body does not exist.
    MissingBody {
        /// The missing body.
        body: BodyId,
    },
    /// A probed particle index is out of range for the target body.
    ParticleOutOfRange {
        /// The target body.
        body: BodyId,
        /// The out-of-range index.
        particle: usize,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingBody { body } => write!(f, "recorder target body {body} not found"),
            Self::ParticleOutOfRange { body, particle } => {
                write!(f, "particle {particle} out of range for body {body}")
            }
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RecordError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors from writing or restoring restart snapshots.
#[derive(Debug)]
pub enum RestartError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The snapshot text could not be parsed.
    MalformedSnapshot {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The snapshot's bodies do not match the configured setup.
    BodyMismatch {
        /// Description of the mismatch (name or particle count).
        detail: String,
    },
    /// No snapshot exists for the requested iteration.
    SnapshotNotFound {
        /// The requested iteration.
        iteration: u64,
    },
}

impl fmt::Display for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MalformedSnapshot { detail } => write!(f, "malformed snapshot: {detail}"),
            Self::BodyMismatch { detail } => write!(f, "snapshot/setup mismatch: {detail}"),
            Self::SnapshotNotFound { iteration } => {
                write!(f, "no restart snapshot for iteration {iteration}")
            }
        }
    }
}

impl std::error::Error for RestartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RestartError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
