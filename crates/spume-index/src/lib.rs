//! Neighbor index: cell-linked lists and relation neighbor graphs.
//!
//! The [`NeighborIndex`] owns one [`CellGrid`](cell_grid::CellGrid) per
//! body and one set of neighbor lists per declared relation. Rebuilds
//! are driven exclusively by the scheduler between advection intervals
//! (and once after a restart restore); operators read the index but
//! never trigger a rebuild themselves. A stale index silently produces
//! wrong forces, so the refresh contract is a correctness requirement,
//! not an optimization.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell_grid;

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::error::Error;
use std::fmt;

use spume_body::{Body, BodyStore, Relation};
use spume_core::{BodyId, RelationId};

pub use cell_grid::CellGrid;

/// Neighbor list for one particle: indices into a target body's arrays.
pub type NeighborList = SmallVec<[u32; 16]>;

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from neighbor-index rebuilds.
///
/// These indicate a setup bug (a relation referencing an unregistered
/// body, or a relation rebuild requested before its grids exist), not
/// a runtime condition; the scheduler validates its rebuild plan at
/// construction so they do not occur in a correct configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// A relation references a body with no registered cell grid.
    MissingGrid {
        /// The body without a grid.
        body: BodyId,
    },
    /// A relation references a body not present in the store.
    MissingBody {
        /// The missing body.
        body: BodyId,
    },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGrid { body } => write!(f, "no cell grid built for body {body}"),
            Self::MissingBody { body } => write!(f, "body {body} not found in store"),
        }
    }
}

impl Error for IndexError {}

// ── Relation neighbor storage ──────────────────────────────────────

/// Built neighbor lists for one relation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationNeighbors {
    /// Self-neighbor lists, one per particle of the owning body.
    /// `None` for a pure contact relation.
    pub inner: Option<Vec<NeighborList>>,
    /// Contact lists per target body, one list per particle of the
    /// owning body.
    pub contact: Vec<(BodyId, Vec<NeighborList>)>,
    /// Grid generations this build observed, for staleness audits.
    built_against: Vec<(BodyId, u64)>,
}

// ── NeighborIndex ──────────────────────────────────────────────────

struct BodyGrid {
    grid: CellGrid,
    generation: u64,
}

/// Owns all cell grids and relation neighbor lists.
#[derive(Default)]
pub struct NeighborIndex {
    grids: IndexMap<BodyId, BodyGrid>,
    relations: IndexMap<RelationId, RelationNeighbors>,
}

impl NeighborIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cell-linked list for one body.
    ///
    /// Must be called for every body whose particle positions changed
    /// since the last rebuild, before any relation referencing that
    /// body is rebuilt or read.
    pub fn rebuild_cell_index(&mut self, id: BodyId, body: &Body) {
        let generation = self.grids.get(&id).map_or(1, |g| g.generation + 1);
        let grid = CellGrid::build(&body.particles.position, body.support_radius());
        self.grids.insert(id, BodyGrid { grid, generation });
    }

    /// Recompute the neighbor lists for one relation.
    ///
    /// Requires a current cell grid for every body the relation
    /// references. The exact distance criterion is symmetric in the
    /// support radii: a pair is neighboring when closer than the larger
    /// of the two bodies' support radii.
    pub fn rebuild_relation(
        &mut self,
        id: RelationId,
        relation: &Relation,
        bodies: &BodyStore,
    ) -> Result<(), IndexError> {
        let owner_id = relation.body();
        let owner = bodies
            .get(owner_id)
            .ok_or(IndexError::MissingBody { body: owner_id })?;

        let mut built_against = Vec::new();
        for b in relation.referenced_bodies() {
            let grid = self.grids.get(&b).ok_or(IndexError::MissingGrid { body: b })?;
            built_against.push((b, grid.generation));
        }

        let inner = if relation.includes_inner() {
            let grid = &self.grids[&owner_id].grid;
            let radius = owner.support_radius();
            let lists = owner
                .particles
                .position
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    grid.candidates_within(p, radius)
                        .into_iter()
                        .filter(|&j| {
                            j as usize != i
                                && (owner.particles.position[j as usize] - p).norm() <= radius
                        })
                        .collect()
                })
                .collect();
            Some(lists)
        } else {
            None
        };

        let mut contact = Vec::new();
        for &target_id in relation.targets() {
            let target = bodies
                .get(target_id)
                .ok_or(IndexError::MissingBody { body: target_id })?;
            let grid = &self.grids[&target_id].grid;
            let radius = owner.support_radius().max(target.support_radius());
            let lists = owner
                .particles
                .position
                .iter()
                .map(|&p| {
                    grid.candidates_within(p, radius)
                        .into_iter()
                        .filter(|&j| (target.particles.position[j as usize] - p).norm() <= radius)
                        .collect()
                })
                .collect();
            contact.push((target_id, lists));
        }

        self.relations.insert(
            id,
            RelationNeighbors {
                inner,
                contact,
                built_against,
            },
        );
        Ok(())
    }

    /// The built neighbor lists for a relation, if any.
    pub fn relation(&self, id: RelationId) -> Option<&RelationNeighbors> {
        self.relations.get(&id)
    }

    /// Self-neighbor lists for a relation.
    pub fn inner_neighbors(&self, id: RelationId) -> Option<&[NeighborList]> {
        self.relations.get(&id)?.inner.as_deref()
    }

    /// Contact neighbor lists for a relation, toward one target body.
    pub fn contact_neighbors(&self, id: RelationId, target: BodyId) -> Option<&[NeighborList]> {
        self.relations
            .get(&id)?
            .contact
            .iter()
            .find(|(b, _)| *b == target)
            .map(|(_, lists)| lists.as_slice())
    }

    /// Whether a relation's lists were built against the current grid
    /// generations of every body it references.
    ///
    /// Staleness is a programming-contract violation, not a user
    /// error; the scheduler upholds this by construction and tests
    /// audit it here.
    pub fn relation_is_current(&self, id: RelationId) -> bool {
        let Some(rel) = self.relations.get(&id) else {
            return false;
        };
        rel.built_against
            .iter()
            .all(|(b, gen)| self.grids.get(b).is_some_and(|g| g.generation == *gen))
    }

    /// Current grid generation for a body, if one was built.
    pub fn grid_generation(&self, id: BodyId) -> Option<u64> {
        self.grids.get(&id).map(|g| g.generation)
    }
}

impl fmt::Debug for NeighborIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeighborIndex")
            .field("grids", &self.grids.len())
            .field("relations", &self.relations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spume_body::{BodyKind, Material, ParticleArrays, Vec2};

    fn fluid_row(n: usize, spacing: f64) -> Body {
        let positions = (0..n).map(|i| Vec2::new(i as f64 * spacing, 0.0)).collect();
        Body::new(
            "water",
            BodyKind::Fluid,
            Material::weakly_compressible(1000.0, 1.0),
            1.3 * spacing,
            ParticleArrays::at_rest(positions, 1000.0, spacing),
        )
    }

    fn one_body_store() -> (BodyStore, BodyId) {
        let mut store = BodyStore::new();
        let id = store.push(fluid_row(5, 0.1));
        (store, id)
    }

    #[test]
    fn inner_rebuild_finds_adjacent_particles() {
        let (store, id) = one_body_store();
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(RelationId(0), &Relation::Inner { body: id }, &store)
            .unwrap();

        let lists = index.inner_neighbors(RelationId(0)).unwrap();
        assert_eq!(lists.len(), 5);
        // Support radius 0.26 covers two lattice spacings of 0.1.
        assert!(lists[0].contains(&1));
        assert!(lists[0].contains(&2));
        assert!(!lists[0].contains(&0), "a particle is not its own neighbor");
        assert!(!lists[0].contains(&3));
    }

    #[test]
    fn rebuild_twice_without_motion_is_idempotent() {
        let (store, id) = one_body_store();
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(RelationId(0), &Relation::Inner { body: id }, &store)
            .unwrap();
        let first = index.relation(RelationId(0)).unwrap().clone();

        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(RelationId(0), &Relation::Inner { body: id }, &store)
            .unwrap();
        let second = index.relation(RelationId(0)).unwrap();

        assert_eq!(first.inner, second.inner);
        assert_eq!(first.contact, second.contact);
    }

    #[test]
    fn contact_rebuild_links_across_bodies() {
        let mut store = BodyStore::new();
        let fluid = store.push(fluid_row(3, 0.1));
        let mut solid_body = fluid_row(3, 0.1);
        for p in &mut solid_body.particles.position {
            p.y = 0.1;
        }
        solid_body.kind = BodyKind::Solid;
        let solid = store.push(solid_body);

        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(fluid, store.get(fluid).unwrap());
        index.rebuild_cell_index(solid, store.get(solid).unwrap());
        index
            .rebuild_relation(
                RelationId(0),
                &Relation::Contact {
                    body: solid,
                    targets: vec![fluid],
                },
                &store,
            )
            .unwrap();

        let lists = index.contact_neighbors(RelationId(0), fluid).unwrap();
        assert_eq!(lists.len(), 3);
        assert!(lists.iter().all(|l| !l.is_empty()));
        assert!(index.inner_neighbors(RelationId(0)).is_none());
    }

    #[test]
    fn relation_rebuild_without_grid_fails() {
        let (store, id) = one_body_store();
        let mut index = NeighborIndex::new();
        let result = index.rebuild_relation(RelationId(0), &Relation::Inner { body: id }, &store);
        assert_eq!(result, Err(IndexError::MissingGrid { body: id }));
    }

    #[test]
    fn staleness_detected_after_grid_rebuild() {
        let (store, id) = one_body_store();
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(RelationId(0), &Relation::Inner { body: id }, &store)
            .unwrap();
        assert!(index.relation_is_current(RelationId(0)));

        // A grid rebuild without a matching relation rebuild leaves
        // the relation stale.
        index.rebuild_cell_index(id, store.get(id).unwrap());
        assert!(!index.relation_is_current(RelationId(0)));
    }

    #[test]
    fn grid_generation_increments_per_rebuild() {
        let (store, id) = one_body_store();
        let mut index = NeighborIndex::new();
        assert_eq!(index.grid_generation(id), None);
        index.rebuild_cell_index(id, store.get(id).unwrap());
        assert_eq!(index.grid_generation(id), Some(1));
        index.rebuild_cell_index(id, store.get(id).unwrap());
        assert_eq!(index.grid_generation(id), Some(2));
    }
}
