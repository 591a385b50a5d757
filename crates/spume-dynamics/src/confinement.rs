//! Static confinement: wall effects from an analytic surface instead
//! of wall particles.
//!
//! A confinement region is described by a signed-distance surface and
//! contributes three boundary corrections, one per fluid operator it
//! hooks into: a near-wall density contribution for the summation, a
//! repulsion term for the pressure relaxation, and a no-penetration
//! correction for the density relaxation. Each correction is an
//! [`Operator`] meant to be registered as a post-process on the
//! corresponding fluid operator.

use std::sync::Arc;

use spume_body::{BodyStore, Vec2};
use spume_core::{BodyId, OperatorError};
use spume_index::NeighborIndex;

use crate::kernel::weight;
use crate::operator::Operator;

/// An analytic confinement surface.
///
/// Distances are signed: positive inside the allowed region, negative
/// beyond the wall. The normal always points into the allowed region.
pub trait SignedSurface: Send + Sync {
    /// Signed distance from `p` to the surface.
    fn signed_distance(&self, p: Vec2) -> f64;

    /// Unit normal at the surface point nearest `p`, pointing into the
    /// allowed region.
    fn inward_normal(&self, p: Vec2) -> Vec2;
}

/// The half-plane on the inward side of a line.
#[derive(Clone, Debug)]
pub struct HalfPlane {
    anchor: Vec2,
    inward: Vec2,
}

impl HalfPlane {
    /// Half-plane through `anchor` whose allowed side is the direction
    /// of `inward` (normalized here).
    pub fn new(anchor: Vec2, inward: Vec2) -> Self {
        debug_assert!(inward.norm() > 0.0);
        Self {
            anchor,
            inward: inward / inward.norm(),
        }
    }
}

impl SignedSurface for HalfPlane {
    fn signed_distance(&self, p: Vec2) -> f64 {
        (p - self.anchor).dot(&self.inward)
    }

    fn inward_normal(&self, _p: Vec2) -> Vec2 {
        self.inward
    }
}

/// Factory for the three boundary-correction operators of one
/// confinement region.
///
/// ```ignore
/// let wall = StaticConfinement::new(fluid, Arc::new(HalfPlane::new(...)));
/// density_summation.push_post_process(wall.density_summation());
/// pressure_relaxation.push_post_process(wall.pressure_relaxation());
/// density_relaxation.push_post_process(wall.density_relaxation());
/// ```
pub struct StaticConfinement {
    body: BodyId,
    surface: Arc<dyn SignedSurface>,
}

impl StaticConfinement {
    /// Confinement of `body` by `surface`.
    pub fn new(body: BodyId, surface: Arc<dyn SignedSurface>) -> Self {
        Self { body, surface }
    }

    /// Near-wall density contribution, for the summation operator.
    pub fn density_summation(&self) -> Box<dyn Operator> {
        Box::new(ConfinementDensity {
            body: self.body,
            surface: self.surface.clone(),
        })
    }

    /// Wall repulsion, for the pressure relaxation operator.
    pub fn pressure_relaxation(&self) -> Box<dyn Operator> {
        Box::new(ConfinementRepulsion {
            body: self.body,
            surface: self.surface.clone(),
        })
    }

    /// No-penetration correction, for the density relaxation operator.
    pub fn density_relaxation(&self) -> Box<dyn Operator> {
        Box::new(ConfinementNoPenetration {
            body: self.body,
            surface: self.surface.clone(),
        })
    }
}

fn missing_body(body: BodyId) -> OperatorError {
    OperatorError::MissingBody { body }
}

struct ConfinementDensity {
    body: BodyId,
    surface: Arc<dyn SignedSurface>,
}

impl Operator for ConfinementDensity {
    fn name(&self) -> &str {
        "confinement_density"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        _index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let radius = body.support_radius();
        let rho0 = body.material.rest_density;
        let p = &mut body.particles;
        for i in 0..p.len() {
            let dist = self.surface.signed_distance(p.position[i]);
            if dist >= 0.0 {
                // The mirrored wall mass sits at twice the distance.
                p.density[i] += rho0 * weight(2.0 * dist, radius);
            }
        }
        Ok(())
    }
}

struct ConfinementRepulsion {
    body: BodyId,
    surface: Arc<dyn SignedSurface>,
}

impl Operator for ConfinementRepulsion {
    fn name(&self) -> &str {
        "confinement_repulsion"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        _index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let h = body.smoothing_length;
        let c = body.material.sound_speed;
        let p = &mut body.particles;
        for i in 0..p.len() {
            let dist = self.surface.signed_distance(p.position[i]);
            if dist < h {
                let n = self.surface.inward_normal(p.position[i]);
                let acc = c * c * (h - dist) / (h * h);
                p.velocity[i] += dt * acc * n;
            }
        }
        Ok(())
    }
}

struct ConfinementNoPenetration {
    body: BodyId,
    surface: Arc<dyn SignedSurface>,
}

impl Operator for ConfinementNoPenetration {
    fn name(&self) -> &str {
        "confinement_no_penetration"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        _index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let radius = body.support_radius();
        let p = &mut body.particles;
        for i in 0..p.len() {
            let dist = self.surface.signed_distance(p.position[i]);
            if dist < radius {
                let n = self.surface.inward_normal(p.position[i]);
                let outward = -p.velocity[i].dot(&n);
                if outward > 0.0 {
                    p.velocity[i] += outward * n;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spume_body::{Body, BodyKind, Material, ParticleArrays};

    fn floor_setup(y: f64) -> (BodyStore, NeighborIndex, BodyId, StaticConfinement) {
        let spacing = 0.1;
        let body = Body::new(
            "water",
            BodyKind::Fluid,
            Material::weakly_compressible(1000.0, 1.0),
            1.3 * spacing,
            ParticleArrays::at_rest(vec![Vec2::new(0.0, y)], 1000.0, spacing),
        );
        let mut store = BodyStore::new();
        let id = store.push(body);
        let wall = StaticConfinement::new(
            id,
            Arc::new(HalfPlane::new(Vec2::zeros(), Vec2::new(0.0, 1.0))),
        );
        (store, NeighborIndex::new(), id, wall)
    }

    #[test]
    fn half_plane_signed_distance() {
        let floor = HalfPlane::new(Vec2::zeros(), Vec2::new(0.0, 2.0));
        assert_relative_eq!(floor.signed_distance(Vec2::new(3.0, 0.5)), 0.5);
        assert_relative_eq!(floor.signed_distance(Vec2::new(-1.0, -0.25)), -0.25);
        assert_relative_eq!(floor.inward_normal(Vec2::zeros()).norm(), 1.0);
    }

    #[test]
    fn density_rises_near_the_wall_only() {
        let (mut store, index, id, wall) = floor_setup(0.05);
        wall.density_summation()
            .execute(&mut store, &index, 0.0)
            .unwrap();
        assert!(store.get(id).unwrap().particles.density[0] > 1000.0);

        let (mut far_store, far_index, far_id, far_wall) = floor_setup(5.0);
        far_wall
            .density_summation()
            .execute(&mut far_store, &far_index, 0.0)
            .unwrap();
        assert_relative_eq!(far_store.get(far_id).unwrap().particles.density[0], 1000.0);
    }

    #[test]
    fn wall_repels_a_particle_inside_the_boundary_layer() {
        let (mut store, index, id, wall) = floor_setup(0.01);
        wall.pressure_relaxation()
            .execute(&mut store, &index, 1e-4)
            .unwrap();
        assert!(store.get(id).unwrap().particles.velocity[0].y > 0.0);
    }

    #[test]
    fn no_penetration_removes_only_the_outward_component() {
        let (mut store, index, id, wall) = floor_setup(0.05);
        store.get_mut(id).unwrap().particles.velocity[0] = Vec2::new(0.7, -2.0);
        wall.density_relaxation()
            .execute(&mut store, &index, 1e-4)
            .unwrap();
        let v = store.get(id).unwrap().particles.velocity[0];
        assert_relative_eq!(v.x, 0.7);
        assert_relative_eq!(v.y, 0.0);
    }

    #[test]
    fn inward_velocity_is_untouched() {
        let (mut store, index, id, wall) = floor_setup(0.05);
        store.get_mut(id).unwrap().particles.velocity[0] = Vec2::new(0.0, 1.5);
        wall.density_relaxation()
            .execute(&mut store, &index, 1e-4)
            .unwrap();
        assert_relative_eq!(store.get(id).unwrap().particles.velocity[0].y, 1.5);
    }
}
