//! Solid-phase operators: the two stress relaxation half-steps, the
//! region constraint between them, surface normal updates and the
//! velocity-averaging bracket around a solid sub-cycle.

use spume_body::{Body, BodyStore, Vec2};
use spume_core::{BodyId, OperatorError, RelationId};
use spume_index::NeighborIndex;

use crate::kernel::weight;
use crate::operator::{AveragingBracket, Operator};

fn missing_body(body: BodyId) -> OperatorError {
    OperatorError::MissingBody { body }
}

/// Total acceleration of each solid particle at its current
/// configuration: linear elastic restoring force from the displacement
/// mismatch against the reference lattice, with stiffness `c²/h²`,
/// plus gravity and the fluid pressure force.
fn total_acceleration(
    body: &Body,
    inner: &[spume_index::NeighborList],
    gravity: Vec2,
) -> Vec<Vec2> {
    let p = &body.particles;
    let radius = body.support_radius();
    let h = body.smoothing_length;
    let c = body.material.sound_speed;
    let stiffness = c * c / (h * h);

    inner
        .iter()
        .enumerate()
        .map(|(i, list)| {
            let mut mismatch = Vec2::zeros();
            let mut total_w = 0.0;
            for &j in list {
                let j = j as usize;
                let current = p.position[j] - p.position[i];
                let reference = p.reference_position[j] - p.reference_position[i];
                let w = weight(reference.norm(), radius);
                mismatch += w * (current - reference);
                total_w += w;
            }
            let elastic = if total_w > 0.0 {
                stiffness * mismatch / total_w
            } else {
                Vec2::zeros()
            };
            elastic + gravity + p.force_from_fluid[i] / p.mass[i]
        })
        .collect()
}

// ── Stress relaxation halves ───────────────────────────────────────

/// First half of one solid sub-step: evaluate accelerations at the
/// current configuration, advance velocity and position by half the
/// sub-step. The region constraint runs between the two halves.
pub struct StressRelaxationFirstHalf {
    body: BodyId,
    relation: RelationId,
    gravity: Vec2,
}

impl StressRelaxationFirstHalf {
    /// First-half operator for `body` over its inner `relation`.
    pub fn new(body: BodyId, relation: RelationId, gravity: Vec2) -> Self {
        Self {
            body,
            relation,
            gravity,
        }
    }
}

impl Operator for StressRelaxationFirstHalf {
    fn name(&self) -> &str {
        "stress_relaxation_first_half"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let inner = index
            .inner_neighbors(self.relation)
            .ok_or(OperatorError::MissingRelation {
                relation: self.relation,
            })?;
        let acc = {
            let body = bodies.get(self.body).ok_or(missing_body(self.body))?;
            total_acceleration(body, inner, self.gravity)
        };
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let p = &mut body.particles;
        for i in 0..p.len() {
            if p.constrained[i] {
                continue;
            }
            p.acceleration[i] = acc[i];
            p.velocity[i] += 0.5 * dt * acc[i];
            p.position[i] += 0.5 * dt * p.velocity[i];
        }
        Ok(())
    }
}

/// Second half of one solid sub-step: re-evaluate accelerations at the
/// mid-step configuration, complete the velocity and position updates.
pub struct StressRelaxationSecondHalf {
    body: BodyId,
    relation: RelationId,
    gravity: Vec2,
}

impl StressRelaxationSecondHalf {
    /// Second-half operator for `body` over its inner `relation`.
    pub fn new(body: BodyId, relation: RelationId, gravity: Vec2) -> Self {
        Self {
            body,
            relation,
            gravity,
        }
    }
}

impl Operator for StressRelaxationSecondHalf {
    fn name(&self) -> &str {
        "stress_relaxation_second_half"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let inner = index
            .inner_neighbors(self.relation)
            .ok_or(OperatorError::MissingRelation {
                relation: self.relation,
            })?;
        let acc = {
            let body = bodies.get(self.body).ok_or(missing_body(self.body))?;
            total_acceleration(body, inner, self.gravity)
        };
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let p = &mut body.particles;
        for i in 0..p.len() {
            if p.constrained[i] {
                continue;
            }
            p.acceleration[i] = acc[i];
            p.velocity[i] += 0.5 * dt * acc[i];
            p.position[i] += 0.5 * dt * p.velocity[i];
        }
        Ok(())
    }
}

// ── Region constraint ──────────────────────────────────────────────

/// Holds tagged particles fixed: zero velocity and acceleration.
///
/// Runs between the two stress relaxation halves so a clamped edge
/// never acquires momentum from either half.
pub struct ConstrainRegion {
    body: BodyId,
}

impl ConstrainRegion {
    /// Constraint enforcement for `body`'s tagged particles.
    pub fn new(body: BodyId) -> Self {
        Self { body }
    }
}

impl Operator for ConstrainRegion {
    fn name(&self) -> &str {
        "constrain_region"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        _index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let p = &mut body.particles;
        for i in 0..p.len() {
            if p.constrained[i] {
                p.velocity[i] = Vec2::zeros();
                p.acceleration[i] = Vec2::zeros();
            }
        }
        Ok(())
    }
}

// ── Surface normals ────────────────────────────────────────────────

/// Recomputes outward surface normals from the particle distribution.
///
/// The normal at a particle is the direction of the local neighbor
/// deficit; interior particles with a balanced neighborhood keep their
/// previous normal. Runs once per advection interval, after the index
/// refresh, so contact force directions stay current as the solid
/// deforms.
pub struct UpdateNormals {
    body: BodyId,
    relation: RelationId,
}

impl UpdateNormals {
    /// Normal update for `body` over its inner `relation`.
    pub fn new(body: BodyId, relation: RelationId) -> Self {
        Self { body, relation }
    }
}

impl Operator for UpdateNormals {
    fn name(&self) -> &str {
        "update_normals"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        let inner = index
            .inner_neighbors(self.relation)
            .ok_or(OperatorError::MissingRelation {
                relation: self.relation,
            })?;
        let normals = {
            let body = bodies.get(self.body).ok_or(missing_body(self.body))?;
            let radius = body.support_radius();
            let p = &body.particles;
            inner
                .iter()
                .enumerate()
                .map(|(i, list)| {
                    let mut deficit = Vec2::zeros();
                    for &j in list {
                        let j = j as usize;
                        let d = p.position[j] - p.position[i];
                        let r = d.norm();
                        if r == 0.0 {
                            continue;
                        }
                        deficit -= weight(r, radius) * d / r;
                    }
                    if deficit.norm() > 1e-12 {
                        Some(deficit / deficit.norm())
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
        };
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        for (n, new) in body.particles.normal.iter_mut().zip(normals) {
            if let Some(v) = new {
                *n = v;
            }
        }
        Ok(())
    }
}

// ── Velocity averaging ─────────────────────────────────────────────

/// Velocity-averaging bracket for one solid body.
///
/// Records positions when the sub-cycle begins; afterwards the average
/// velocity over the covered acoustic step is the net displacement
/// divided by that step. The fluid contact terms read this field
/// instead of the solid's instantaneous (finer-clock) velocity.
pub struct AverageVelocity {
    body: BodyId,
    initial_position: Vec<Vec2>,
}

impl AverageVelocity {
    /// Averaging bracket for `body`.
    pub fn new(body: BodyId) -> Self {
        Self {
            body,
            initial_position: Vec::new(),
        }
    }
}

impl AveragingBracket for AverageVelocity {
    fn initialize_displacement(&mut self, bodies: &BodyStore) {
        if let Some(body) = bodies.get(self.body) {
            self.initial_position.clear();
            self.initial_position
                .extend_from_slice(&body.particles.position);
        }
    }

    fn update_averages(&mut self, bodies: &mut BodyStore, dt: f64) {
        debug_assert!(dt > 0.0, "averaging interval must be positive, got {dt}");
        let Some(body) = bodies.get_mut(self.body) else {
            return;
        };
        let p = &mut body.particles;
        debug_assert_eq!(self.initial_position.len(), p.len());
        for i in 0..p.len() {
            p.velocity_average[i] = (p.position[i] - self.initial_position[i]) / dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spume_body::{BodyKind, Material, ParticleArrays, Relation};

    fn solid_row(n: usize) -> (BodyStore, NeighborIndex, BodyId, RelationId) {
        let spacing = 0.1;
        let positions: Vec<_> = (0..n).map(|i| Vec2::new(i as f64 * spacing, 0.0)).collect();
        let body = Body::new(
            "gate",
            BodyKind::Solid,
            Material::elastic(1100.0, 20.0),
            1.3 * spacing,
            ParticleArrays::at_rest(positions, 1100.0, spacing),
        );
        let mut store = BodyStore::new();
        let id = store.push(body);
        let rel = RelationId(0);
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(rel, &Relation::Inner { body: id }, &store)
            .unwrap();
        (store, index, id, rel)
    }

    #[test]
    fn stretched_particle_is_pulled_back() {
        let (mut store, index, id, rel) = solid_row(3);
        // Displace the end particle outward from its reference site.
        store.get_mut(id).unwrap().particles.position[2].x += 0.02;

        let mut first = StressRelaxationFirstHalf::new(id, rel, Vec2::zeros());
        let mut second = StressRelaxationSecondHalf::new(id, rel, Vec2::zeros());
        let dt = 1e-4;
        first.execute(&mut store, &index, dt).unwrap();
        second.execute(&mut store, &index, dt).unwrap();

        let p = &store.get(id).unwrap().particles;
        assert!(
            p.velocity[2].x < 0.0,
            "displaced particle accelerates back toward its reference site"
        );
        assert!(
            p.velocity[1].x > 0.0,
            "neighbor is dragged toward the displaced particle"
        );
    }

    #[test]
    fn undeformed_solid_without_gravity_stays_at_rest() {
        let (mut store, index, id, rel) = solid_row(4);
        let mut first = StressRelaxationFirstHalf::new(id, rel, Vec2::zeros());
        let mut second = StressRelaxationSecondHalf::new(id, rel, Vec2::zeros());
        first.execute(&mut store, &index, 1e-4).unwrap();
        second.execute(&mut store, &index, 1e-4).unwrap();
        let p = &store.get(id).unwrap().particles;
        assert!(p.velocity.iter().all(|v| v.norm() < 1e-12));
    }

    #[test]
    fn fluid_force_accelerates_solid() {
        let (mut store, index, id, rel) = solid_row(3);
        {
            let p = &mut store.get_mut(id).unwrap().particles;
            let m = p.mass[1];
            p.force_from_fluid[1] = Vec2::new(0.0, -2.0 * m);
        }
        let mut first = StressRelaxationFirstHalf::new(id, rel, Vec2::zeros());
        let dt = 1e-3;
        first.execute(&mut store, &index, dt).unwrap();
        let p = &store.get(id).unwrap().particles;
        // Half-step velocity from a = F/m = -2.
        assert_relative_eq!(p.velocity[1].y, -2.0 * 0.5 * dt, epsilon = 1e-9);
    }

    #[test]
    fn constrained_particles_never_move() {
        let (mut store, index, id, rel) = solid_row(3);
        store.get_mut(id).unwrap().particles.constrained[0] = true;
        let x0 = store.get(id).unwrap().particles.position[0];

        let gravity = Vec2::new(0.0, -9.81);
        let mut first = StressRelaxationFirstHalf::new(id, rel, gravity);
        let mut constrain = ConstrainRegion::new(id);
        let mut second = StressRelaxationSecondHalf::new(id, rel, gravity);
        let dt = 1e-3;
        for _ in 0..5 {
            first.execute(&mut store, &index, dt).unwrap();
            constrain.execute(&mut store, &index, dt).unwrap();
            second.execute(&mut store, &index, dt).unwrap();
        }

        let p = &store.get(id).unwrap().particles;
        assert_eq!(p.position[0], x0);
        assert_eq!(p.velocity[0], Vec2::zeros());
        assert!(p.velocity[1].y < 0.0, "free particles fall");
    }

    #[test]
    fn normals_point_away_from_the_body() {
        let (mut store, index, id, rel) = solid_row(5);
        let mut op = UpdateNormals::new(id, rel);
        op.execute(&mut store, &index, 0.0).unwrap();
        let p = &store.get(id).unwrap().particles;
        // Left end: all neighbors lie to the right, normal points left.
        assert!(p.normal[0].x < -0.9);
        // Right end mirrors it.
        assert!(p.normal[4].x > 0.9);
    }

    #[test]
    fn averaging_bracket_reports_net_displacement_rate() {
        let (mut store, _index, id, _rel) = solid_row(2);
        let mut bracket = AverageVelocity::new(id);
        bracket.initialize_displacement(&store);
        store.get_mut(id).unwrap().particles.position[1] += Vec2::new(0.004, -0.002);
        bracket.update_averages(&mut store, 0.004);

        let p = &store.get(id).unwrap().particles;
        assert_relative_eq!(p.velocity_average[1].x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.velocity_average[1].y, -0.5, epsilon = 1e-12);
        assert_eq!(p.velocity_average[0], Vec2::zeros());
    }
}
