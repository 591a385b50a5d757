//! Relation descriptors: which bodies interact with which.
//!
//! A relation declares a neighbor graph over body pairs. It is rebuilt
//! as a whole by the neighbor index, never mutated particle-by-particle
//! by the scheduler.

use spume_core::BodyId;

/// A declared neighbor graph over one or more bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    /// Self-neighbors: particles of `body` interacting with other
    /// particles of the same body.
    Inner {
        /// The owning body.
        body: BodyId,
    },
    /// Cross-body neighbors: particles of `body` interacting with
    /// particles of each target body.
    Contact {
        /// The owning body.
        body: BodyId,
        /// The bodies whose particles are searched for neighbors.
        targets: Vec<BodyId>,
    },
    /// Inner plus one or more contacts, used where a body interacts
    /// both with itself and with surrounding bodies in one pass.
    Complex {
        /// The owning body.
        body: BodyId,
        /// The contact targets, in addition to the inner part.
        targets: Vec<BodyId>,
    },
}

impl Relation {
    /// The body that owns this relation.
    pub fn body(&self) -> BodyId {
        match self {
            Self::Inner { body } | Self::Contact { body, .. } | Self::Complex { body, .. } => *body,
        }
    }

    /// Contact targets, empty for an inner relation.
    pub fn targets(&self) -> &[BodyId] {
        match self {
            Self::Inner { .. } => &[],
            Self::Contact { targets, .. } | Self::Complex { targets, .. } => targets,
        }
    }

    /// Whether the relation includes the owning body's self-neighbors.
    pub fn includes_inner(&self) -> bool {
        matches!(self, Self::Inner { .. } | Self::Complex { .. })
    }

    /// All bodies this relation reads positions from.
    pub fn referenced_bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        std::iter::once(self.body()).chain(self.targets().iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_relation_has_no_targets() {
        let r = Relation::Inner { body: BodyId(0) };
        assert_eq!(r.body(), BodyId(0));
        assert!(r.targets().is_empty());
        assert!(r.includes_inner());
    }

    #[test]
    fn contact_relation_excludes_inner() {
        let r = Relation::Contact {
            body: BodyId(2),
            targets: vec![BodyId(0)],
        };
        assert!(!r.includes_inner());
        assert_eq!(r.targets(), &[BodyId(0)]);
    }

    #[test]
    fn complex_relation_references_all_bodies() {
        let r = Relation::Complex {
            body: BodyId(0),
            targets: vec![BodyId(1), BodyId(2)],
        };
        let refs: Vec<_> = r.referenced_bodies().collect();
        assert_eq!(refs, vec![BodyId(0), BodyId(1), BodyId(2)]);
        assert!(r.includes_inner());
    }
}
