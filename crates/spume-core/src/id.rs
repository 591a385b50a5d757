//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a body within a simulation.
///
/// Bodies are registered at setup and assigned sequential IDs.
/// `BodyId(n)` corresponds to the n-th body in the body store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BodyId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a relation (neighbor graph) between bodies.
///
/// Relations are registered at setup alongside bodies. `RelationId(n)`
/// corresponds to the n-th relation declared for the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub u32);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RelationId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
