//! The one-way force bridge from fluid to solid.

use spume_body::{BodyStore, Vec2};
use spume_core::{BodyId, OperatorError, RelationId};
use spume_index::NeighborIndex;

use crate::kernel::weight_derivative;
use crate::operator::Operator;

/// Samples fluid pressure onto solid surface particles.
///
/// Writes `force_from_fluid` on the solid from the pressures of its
/// fluid contact neighbors; the stress relaxation halves then feed the
/// force into the solid's momentum balance at the finer solid clock.
/// Consumes no step size — it is invoked once per acoustic step, after
/// the fluid's pressure relaxation and before the solid sub-cycle.
pub struct PressureForceOnSolid {
    solid: BodyId,
    fluid: BodyId,
    relation: RelationId,
}

impl PressureForceOnSolid {
    /// Force transfer onto `solid` from `fluid` over the contact
    /// `relation` (owned by the solid, targeting the fluid).
    pub fn new(solid: BodyId, fluid: BodyId, relation: RelationId) -> Self {
        Self {
            solid,
            fluid,
            relation,
        }
    }
}

impl Operator for PressureForceOnSolid {
    fn name(&self) -> &str {
        "pressure_force_on_solid"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        let lists = index
            .contact_neighbors(self.relation, self.fluid)
            .ok_or(OperatorError::MissingRelation {
                relation: self.relation,
            })?;
        let (solid, fluid) = bodies
            .pair_mut(self.solid, self.fluid)
            .ok_or(OperatorError::MissingBody { body: self.solid })?;
        let reach = solid.support_radius().max(fluid.support_radius());
        let sp = &mut solid.particles;
        let fp = &fluid.particles;

        for (i, list) in lists.iter().enumerate() {
            let mut force = Vec2::zeros();
            for &j in list {
                let j = j as usize;
                let d = fp.position[j] - sp.position[i];
                let r = d.norm();
                if r == 0.0 {
                    continue;
                }
                let e = d / r;
                let dwdr = weight_derivative(r, reach);
                force += sp.volume[i] * fp.volume[j] * fp.pressure[j] * dwdr * e;
            }
            sp.force_from_fluid[i] = force;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spume_body::{Body, BodyKind, Material, ParticleArrays, Relation};

    fn fsi_setup() -> (BodyStore, NeighborIndex, BodyId, BodyId, RelationId) {
        let spacing = 0.1;
        let mut store = BodyStore::new();
        let solid = store.push(Body::new(
            "gate",
            BodyKind::Solid,
            Material::elastic(1100.0, 20.0),
            1.3 * spacing,
            ParticleArrays::at_rest(
                (0..3).map(|i| Vec2::new(i as f64 * spacing, 0.0)).collect(),
                1100.0,
                spacing,
            ),
        ));
        let fluid = store.push(Body::new(
            "water",
            BodyKind::Fluid,
            Material::weakly_compressible(1000.0, 1.0),
            1.3 * spacing,
            ParticleArrays::at_rest(
                (0..3)
                    .map(|i| Vec2::new(i as f64 * spacing, spacing))
                    .collect(),
                1000.0,
                spacing,
            ),
        ));

        let rel = RelationId(0);
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(solid, store.get(solid).unwrap());
        index.rebuild_cell_index(fluid, store.get(fluid).unwrap());
        index
            .rebuild_relation(
                rel,
                &Relation::Contact {
                    body: solid,
                    targets: vec![fluid],
                },
                &store,
            )
            .unwrap();
        (store, index, solid, fluid, rel)
    }

    #[test]
    fn pressurized_fluid_pushes_solid_away() {
        let (mut store, index, solid, fluid, rel) = fsi_setup();
        for p in &mut store.get_mut(fluid).unwrap().particles.pressure {
            *p = 500.0;
        }
        let mut op = PressureForceOnSolid::new(solid, fluid, rel);
        op.execute(&mut store, &index, 0.0).unwrap();

        // Fluid sits above the solid; positive pressure pushes down.
        let sp = &store.get(solid).unwrap().particles;
        for f in &sp.force_from_fluid {
            assert!(f.y < 0.0, "force must point away from the fluid, got {f:?}");
        }
    }

    #[test]
    fn unpressurized_fluid_exerts_no_force() {
        let (mut store, index, solid, fluid, rel) = fsi_setup();
        let mut op = PressureForceOnSolid::new(solid, fluid, rel);
        op.execute(&mut store, &index, 0.0).unwrap();
        let sp = &store.get(solid).unwrap().particles;
        assert!(sp.force_from_fluid.iter().all(|f| f.norm() == 0.0));
    }

    #[test]
    fn stale_force_is_overwritten_each_invocation() {
        let (mut store, index, solid, fluid, rel) = fsi_setup();
        store.get_mut(solid).unwrap().particles.force_from_fluid[0] = Vec2::new(7.0, 7.0);
        let mut op = PressureForceOnSolid::new(solid, fluid, rel);
        op.execute(&mut store, &index, 0.0).unwrap();
        assert_eq!(
            store.get(solid).unwrap().particles.force_from_fluid[0],
            Vec2::zeros()
        );
    }

    #[test]
    fn missing_contact_lists_are_reported() {
        let (mut store, index, solid, fluid, _) = fsi_setup();
        let mut op = PressureForceOnSolid::new(solid, fluid, RelationId(3));
        let err = op.execute(&mut store, &index, 0.0).unwrap_err();
        assert_eq!(
            err,
            OperatorError::MissingRelation {
                relation: RelationId(3)
            }
        );
    }
}
