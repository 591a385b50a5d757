//! Body and relation fixtures shared across integration tests.

use spume_body::{Body, BodyKind, BodyStore, Material, ParticleArrays, Relation, Vec2};
use spume_core::{BodyId, RelationId};
use spume_index::NeighborIndex;

/// Particle spacing used by all fixtures.
pub const SPACING: f64 = 0.1;

/// Smoothing-length ratio used by all fixtures.
pub const SMOOTHING: f64 = 1.3 * SPACING;

/// A rectangular fluid patch, `cols × rows` particles on a lattice
/// with its lower-left particle at `origin`.
pub fn fluid_patch(name: &str, origin: Vec2, cols: usize, rows: usize) -> Body {
    let mut positions = Vec::with_capacity(cols * rows);
    for gy in 0..rows {
        for gx in 0..cols {
            positions.push(origin + Vec2::new(gx as f64 * SPACING, gy as f64 * SPACING));
        }
    }
    Body::new(
        name,
        BodyKind::Fluid,
        Material::weakly_compressible(1000.0, 1.0),
        SMOOTHING,
        ParticleArrays::at_rest(positions, 1000.0, SPACING),
    )
}

/// A horizontal solid beam of `cols` particles at `origin`, with its
/// left end constrained.
pub fn clamped_beam(name: &str, origin: Vec2, cols: usize) -> Body {
    let positions: Vec<_> = (0..cols)
        .map(|gx| origin + Vec2::new(gx as f64 * SPACING, 0.0))
        .collect();
    let mut particles = ParticleArrays::at_rest(positions, 1100.0, SPACING);
    particles.constrained[0] = true;
    Body::new(
        name,
        BodyKind::Solid,
        Material::elastic(1100.0, 20.0),
        SMOOTHING,
        particles,
    )
}

/// A single-body fluid setup with its inner relation built.
pub fn fluid_world(cols: usize, rows: usize) -> (BodyStore, NeighborIndex, BodyId, RelationId) {
    let mut store = BodyStore::new();
    let fluid = store.push(fluid_patch("water", Vec2::zeros(), cols, rows));
    let rel = RelationId(0);
    let mut index = NeighborIndex::new();
    index.rebuild_cell_index(fluid, store.get(fluid).unwrap());
    index
        .rebuild_relation(rel, &Relation::Inner { body: fluid }, &store)
        .unwrap();
    (store, index, fluid, rel)
}

/// Relations of the two-body FSI fixture built by [`fsi_world`].
pub struct FsiRelations {
    /// Fluid inner + contact-with-solid relation.
    pub fluid_complex: RelationId,
    /// Solid inner relation.
    pub solid_inner: RelationId,
    /// Solid contact-with-fluid relation.
    pub solid_contact: RelationId,
}

/// A fluid patch resting on a clamped beam, with all three relations
/// built: the standard two-body FSI topology.
pub fn fsi_world() -> (BodyStore, NeighborIndex, BodyId, BodyId, FsiRelations) {
    let mut store = BodyStore::new();
    let solid = store.push(clamped_beam("gate", Vec2::zeros(), 6));
    let fluid = store.push(fluid_patch("water", Vec2::new(0.0, SPACING), 6, 3));

    let relations = FsiRelations {
        fluid_complex: RelationId(0),
        solid_inner: RelationId(1),
        solid_contact: RelationId(2),
    };

    let mut index = NeighborIndex::new();
    index.rebuild_cell_index(solid, store.get(solid).unwrap());
    index.rebuild_cell_index(fluid, store.get(fluid).unwrap());
    index
        .rebuild_relation(
            relations.fluid_complex,
            &Relation::Complex {
                body: fluid,
                targets: vec![solid],
            },
            &store,
        )
        .unwrap();
    index
        .rebuild_relation(
            relations.solid_inner,
            &Relation::Inner { body: solid },
            &store,
        )
        .unwrap();
    index
        .rebuild_relation(
            relations.solid_contact,
            &Relation::Contact {
                body: solid,
                targets: vec![fluid],
            },
            &store,
        )
        .unwrap();

    (store, index, fluid, solid, relations)
}
