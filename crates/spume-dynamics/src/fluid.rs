//! Fluid-phase operators: gravity, density summation, the two
//! relaxation half-steps and velocity damping.
//!
//! The relaxation pair splits one acoustic step: pressure relaxation
//! updates velocity and the first half of position, density relaxation
//! updates density and the second half of position. Summation and both
//! relaxation operators accept post-process hooks so confinement (or
//! any other boundary treatment) can run inside the same pass.

use spume_body::{BodyStore, Vec2};
use spume_core::{BodyId, OperatorError, RelationId};
use spume_index::NeighborIndex;

use crate::kernel::{weight, weight_derivative};
use crate::operator::Operator;

fn missing_body(body: BodyId) -> OperatorError {
    OperatorError::MissingBody { body }
}

fn missing_relation(relation: RelationId) -> OperatorError {
    OperatorError::MissingRelation { relation }
}

// ── Gravity ────────────────────────────────────────────────────────

/// Resets each particle's accumulated acceleration to gravity.
///
/// Runs once per advection interval, before the acoustic sub-cycle;
/// the relaxation operators then add their own contributions on top of
/// this baseline each sub-step.
pub struct GravityInitialization {
    body: BodyId,
    gravity: Vec2,
}

impl GravityInitialization {
    /// Gravity initializer for `body`.
    pub fn new(body: BodyId, gravity: Vec2) -> Self {
        Self { body, gravity }
    }
}

impl Operator for GravityInitialization {
    fn name(&self) -> &str {
        "gravity_initialization"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        _index: &NeighborIndex,
        _dt: f64,
    ) -> Result<(), OperatorError> {
        let body = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        for a in &mut body.particles.acceleration {
            *a = self.gravity;
        }
        Ok(())
    }
}

// ── Density summation ──────────────────────────────────────────────

/// Shepard-normalized density summation.
///
/// `ρ_i = Σ_j m_j w_ij / Σ_j V_j w_ij`, sums running over the particle
/// itself, its inner neighbors and any contact neighbors the relation
/// declares. The normalization makes a resting uniform lattice recover
/// its rest density exactly, with no kernel constant involved.
pub struct DensitySummation {
    body: BodyId,
    relation: RelationId,
    post_processes: Vec<Box<dyn Operator>>,
}

impl DensitySummation {
    /// Density summation for `body` over `relation`.
    pub fn new(body: BodyId, relation: RelationId) -> Self {
        Self {
            body,
            relation,
            post_processes: Vec::new(),
        }
    }

    /// Append a post-process hook, run after the summation each call.
    pub fn push_post_process(&mut self, op: Box<dyn Operator>) {
        self.post_processes.push(op);
    }
}

impl Operator for DensitySummation {
    fn name(&self) -> &str {
        "density_summation"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let rel = index
            .relation(self.relation)
            .ok_or(missing_relation(self.relation))?;
        let densities = {
            let owner = bodies.get(self.body).ok_or(missing_body(self.body))?;
            let radius = owner.support_radius();
            let p = &owner.particles;
            let n = p.len();

            let mut mass_sum = vec![0.0; n];
            let mut volume_sum = vec![0.0; n];
            for i in 0..n {
                mass_sum[i] = p.mass[i];
                volume_sum[i] = p.volume[i];
            }

            if let Some(inner) = &rel.inner {
                for (i, list) in inner.iter().enumerate() {
                    for &j in list {
                        let j = j as usize;
                        let w = weight((p.position[j] - p.position[i]).norm(), radius);
                        mass_sum[i] += p.mass[j] * w;
                        volume_sum[i] += p.volume[j] * w;
                    }
                }
            }

            for (target_id, lists) in &rel.contact {
                let target = bodies.get(*target_id).ok_or(missing_body(*target_id))?;
                let reach = radius.max(target.support_radius());
                let tp = &target.particles;
                for (i, list) in lists.iter().enumerate() {
                    for &j in list {
                        let j = j as usize;
                        let w = weight((tp.position[j] - p.position[i]).norm(), reach);
                        mass_sum[i] += tp.mass[j] * w;
                        volume_sum[i] += tp.volume[j] * w;
                    }
                }
            }

            mass_sum
                .into_iter()
                .zip(volume_sum)
                .map(|(m, v)| m / v)
                .collect::<Vec<_>>()
        };

        let owner = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        owner.particles.density.copy_from_slice(&densities);

        for op in &mut self.post_processes {
            op.execute(bodies, index, dt)?;
        }
        Ok(())
    }
}

// ── Pressure relaxation ────────────────────────────────────────────

/// First relaxation half-step: equation of state, pressure forces,
/// velocity update and the first half of the position update.
///
/// Wall and solid contact neighbors contribute with the owner's own
/// pressure mirrored onto them, which is what makes a resting wall
/// exert exactly the reaction the adjacent fluid column demands.
pub struct PressureRelaxation {
    body: BodyId,
    relation: RelationId,
    post_processes: Vec<Box<dyn Operator>>,
}

impl PressureRelaxation {
    /// Pressure relaxation for `body` over `relation`.
    pub fn new(body: BodyId, relation: RelationId) -> Self {
        Self {
            body,
            relation,
            post_processes: Vec::new(),
        }
    }

    /// Append a post-process hook, run after the half-step each call.
    pub fn push_post_process(&mut self, op: Box<dyn Operator>) {
        self.post_processes.push(op);
    }
}

impl Operator for PressureRelaxation {
    fn name(&self) -> &str {
        "pressure_relaxation"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let rel = index
            .relation(self.relation)
            .ok_or(missing_relation(self.relation))?;

        // Equation of state first so neighbor pressures are current.
        {
            let owner = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
            let c2 = owner.material.sound_speed * owner.material.sound_speed;
            let rho0 = owner.material.rest_density;
            let p = &mut owner.particles;
            for i in 0..p.len() {
                p.pressure[i] = c2 * (p.density[i] - rho0);
            }
        }

        let accelerations = {
            let owner = bodies.get(self.body).ok_or(missing_body(self.body))?;
            let radius = owner.support_radius();
            let p = &owner.particles;
            let mut acc = vec![Vec2::zeros(); p.len()];

            if let Some(inner) = &rel.inner {
                for (i, list) in inner.iter().enumerate() {
                    for &j in list {
                        let j = j as usize;
                        let d = p.position[j] - p.position[i];
                        let r = d.norm();
                        if r == 0.0 {
                            continue;
                        }
                        let e = d / r;
                        let dwdr = weight_derivative(r, radius);
                        let shared = p.mass[j] * (p.pressure[i] + p.pressure[j])
                            / (p.density[i] * p.density[j]);
                        acc[i] += shared * dwdr * e;
                    }
                }
            }

            for (target_id, lists) in &rel.contact {
                let target = bodies.get(*target_id).ok_or(missing_body(*target_id))?;
                let reach = radius.max(target.support_radius());
                let tp = &target.particles;
                for (i, list) in lists.iter().enumerate() {
                    for &j in list {
                        let j = j as usize;
                        let d = tp.position[j] - p.position[i];
                        let r = d.norm();
                        if r == 0.0 {
                            continue;
                        }
                        let e = d / r;
                        let dwdr = weight_derivative(r, reach);
                        // Mirrored pressure on the contact neighbor.
                        let shared = tp.mass[j] * (2.0 * p.pressure[i])
                            / (p.density[i] * tp.density[j]);
                        acc[i] += shared * dwdr * e;
                    }
                }
            }
            acc
        };

        let owner = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let p = &mut owner.particles;
        for i in 0..p.len() {
            p.velocity[i] += dt * (p.acceleration[i] + accelerations[i]);
            p.position[i] += 0.5 * dt * p.velocity[i];
        }

        for op in &mut self.post_processes {
            op.execute(bodies, index, dt)?;
        }
        Ok(())
    }
}

// ── Density relaxation ─────────────────────────────────────────────

/// Second relaxation half-step: continuity-equation density update and
/// the second half of the position update.
///
/// Contact neighbors contribute with their time-averaged velocity, so
/// a sub-cycling solid is seen at the fluid's own clock.
pub struct DensityRelaxation {
    body: BodyId,
    relation: RelationId,
    post_processes: Vec<Box<dyn Operator>>,
}

impl DensityRelaxation {
    /// Density relaxation for `body` over `relation`.
    pub fn new(body: BodyId, relation: RelationId) -> Self {
        Self {
            body,
            relation,
            post_processes: Vec::new(),
        }
    }

    /// Append a post-process hook, run after the half-step each call.
    pub fn push_post_process(&mut self, op: Box<dyn Operator>) {
        self.post_processes.push(op);
    }
}

impl Operator for DensityRelaxation {
    fn name(&self) -> &str {
        "density_relaxation"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let rel = index
            .relation(self.relation)
            .ok_or(missing_relation(self.relation))?;

        let density_rates = {
            let owner = bodies.get(self.body).ok_or(missing_body(self.body))?;
            let radius = owner.support_radius();
            let p = &owner.particles;
            let mut rate = vec![0.0; p.len()];

            if let Some(inner) = &rel.inner {
                for (i, list) in inner.iter().enumerate() {
                    for &j in list {
                        let j = j as usize;
                        let d = p.position[j] - p.position[i];
                        let r = d.norm();
                        if r == 0.0 {
                            continue;
                        }
                        let e = d / r;
                        let dwdr = weight_derivative(r, radius);
                        let rel_v = (p.velocity[i] - p.velocity[j]).dot(&e);
                        rate[i] -= p.density[i] * (p.mass[j] / p.density[j]) * rel_v * dwdr;
                    }
                }
            }

            for (target_id, lists) in &rel.contact {
                let target = bodies.get(*target_id).ok_or(missing_body(*target_id))?;
                let reach = radius.max(target.support_radius());
                let tp = &target.particles;
                for (i, list) in lists.iter().enumerate() {
                    for &j in list {
                        let j = j as usize;
                        let d = tp.position[j] - p.position[i];
                        let r = d.norm();
                        if r == 0.0 {
                            continue;
                        }
                        let e = d / r;
                        let dwdr = weight_derivative(r, reach);
                        let rel_v = (p.velocity[i] - tp.velocity_average[j]).dot(&e);
                        rate[i] -= p.density[i] * (tp.mass[j] / tp.density[j]) * rel_v * dwdr;
                    }
                }
            }
            rate
        };

        let owner = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        let p = &mut owner.particles;
        for i in 0..p.len() {
            p.density[i] += dt * density_rates[i];
            p.position[i] += 0.5 * dt * p.velocity[i];
        }

        for op in &mut self.post_processes {
            op.execute(bodies, index, dt)?;
        }
        Ok(())
    }
}

// ── Damping ────────────────────────────────────────────────────────

/// Velocity damping toward the local neighbor mean.
///
/// Each particle's velocity is relaxed toward the weighted average of
/// its inner neighbors with strength `η`, implicitly in `dt` so large
/// damping coefficients stay stable. Used to settle a configuration
/// toward steady state, and runs at the start of each acoustic step in
/// the coupled loop.
pub struct Damping {
    body: BodyId,
    relation: RelationId,
    strength: f64,
}

impl Damping {
    /// Damping on `body` over `relation` with coefficient `strength`.
    pub fn new(body: BodyId, relation: RelationId, strength: f64) -> Self {
        debug_assert!(strength >= 0.0);
        Self {
            body,
            relation,
            strength,
        }
    }
}

impl Operator for Damping {
    fn name(&self) -> &str {
        "velocity_damping"
    }

    fn execute(
        &mut self,
        bodies: &mut BodyStore,
        index: &NeighborIndex,
        dt: f64,
    ) -> Result<(), OperatorError> {
        let inner = index
            .inner_neighbors(self.relation)
            .ok_or(missing_relation(self.relation))?;

        let new_velocities = {
            let owner = bodies.get(self.body).ok_or(missing_body(self.body))?;
            let radius = owner.support_radius();
            let p = &owner.particles;
            let k = self.strength * dt;

            inner
                .iter()
                .enumerate()
                .map(|(i, list)| {
                    let mut weighted = Vec2::zeros();
                    let mut total = 0.0;
                    for &j in list {
                        let j = j as usize;
                        let w = weight((p.position[j] - p.position[i]).norm(), radius);
                        weighted += w * p.velocity[j];
                        total += w;
                    }
                    if total == 0.0 {
                        p.velocity[i]
                    } else {
                        let mean = weighted / total;
                        (p.velocity[i] + k * mean) / (1.0 + k)
                    }
                })
                .collect::<Vec<_>>()
        };

        let owner = bodies.get_mut(self.body).ok_or(missing_body(self.body))?;
        owner.particles.velocity.copy_from_slice(&new_velocities);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spume_body::{Body, BodyKind, Material, ParticleArrays, Relation};
    use std::sync::{Arc, Mutex};

    fn lattice(n: usize, m: usize, spacing: f64) -> Vec<Vec2> {
        let mut out = Vec::new();
        for gy in 0..m {
            for gx in 0..n {
                out.push(Vec2::new(gx as f64 * spacing, gy as f64 * spacing));
            }
        }
        out
    }

    fn fluid_patch() -> (BodyStore, NeighborIndex, BodyId, RelationId) {
        let spacing = 0.1;
        let body = Body::new(
            "water",
            BodyKind::Fluid,
            Material::weakly_compressible(1000.0, 1.0),
            1.3 * spacing,
            ParticleArrays::at_rest(lattice(6, 6, spacing), 1000.0, spacing),
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
    fn gravity_overwrites_acceleration() {
        let (mut store, index, id, _) = fluid_patch();
        store.get_mut(id).unwrap().particles.acceleration[0] = Vec2::new(9.0, 9.0);
        let mut op = GravityInitialization::new(id, Vec2::new(0.0, -9.81));
        op.execute(&mut store, &index, 0.0).unwrap();
        for a in &store.get(id).unwrap().particles.acceleration {
            assert_relative_eq!(a.y, -9.81);
            assert_relative_eq!(a.x, 0.0);
        }
    }

    #[test]
    fn density_summation_recovers_rest_density_in_bulk() {
        let (mut store, index, id, rel) = fluid_patch();
        // Perturb stored densities; the summation must reconstruct them
        // from positions alone.
        for rho in &mut store.get_mut(id).unwrap().particles.density {
            *rho = 1.0;
        }
        let mut op = DensitySummation::new(id, rel);
        op.execute(&mut store, &index, 0.0).unwrap();
        // Interior particle of a uniform lattice: Shepard normalization
        // gives the rest density exactly.
        let p = &store.get(id).unwrap().particles;
        let center = 2 * 6 + 2;
        assert_relative_eq!(p.density[center], 1000.0, epsilon = 1e-9);
        // Edge particles also land on the rest density because mass and
        // volume sums are truncated identically.
        assert_relative_eq!(p.density[0], 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn pressure_relaxation_pushes_compressed_pair_apart() {
        let spacing = 0.1;
        let body = Body::new(
            "pair",
            BodyKind::Fluid,
            Material::weakly_compressible(1000.0, 1.0),
            1.3 * spacing,
            ParticleArrays::at_rest(
                vec![Vec2::zeros(), Vec2::new(spacing, 0.0)],
                1000.0,
                spacing,
            ),
        );
        let mut store = BodyStore::new();
        let id = store.push(body);
        // Compressed state: densities above rest.
        for rho in &mut store.get_mut(id).unwrap().particles.density {
            *rho = 1100.0;
        }
        let rel = RelationId(0);
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(rel, &Relation::Inner { body: id }, &store)
            .unwrap();

        let mut op = PressureRelaxation::new(id, rel);
        op.execute(&mut store, &index, 1e-4).unwrap();

        let p = &store.get(id).unwrap().particles;
        assert!(p.pressure[0] > 0.0, "EOS must yield positive pressure");
        assert!(p.velocity[0].x < 0.0, "left particle pushed left");
        assert!(p.velocity[1].x > 0.0, "right particle pushed right");
        assert_relative_eq!(p.velocity[0].x, -p.velocity[1].x, epsilon = 1e-12);
    }

    #[test]
    fn density_relaxation_raises_density_of_approaching_pair() {
        let spacing = 0.1;
        let mut particles = ParticleArrays::at_rest(
            vec![Vec2::zeros(), Vec2::new(spacing, 0.0)],
            1000.0,
            spacing,
        );
        particles.velocity[0] = Vec2::new(0.5, 0.0);
        particles.velocity[1] = Vec2::new(-0.5, 0.0);
        let body = Body::new(
            "pair",
            BodyKind::Fluid,
            Material::weakly_compressible(1000.0, 1.0),
            1.3 * spacing,
            particles,
        );
        let mut store = BodyStore::new();
        let id = store.push(body);
        let rel = RelationId(0);
        let mut index = NeighborIndex::new();
        index.rebuild_cell_index(id, store.get(id).unwrap());
        index
            .rebuild_relation(rel, &Relation::Inner { body: id }, &store)
            .unwrap();

        let mut op = DensityRelaxation::new(id, rel);
        op.execute(&mut store, &index, 1e-3).unwrap();

        let p = &store.get(id).unwrap().particles;
        assert!(p.density[0] > 1000.0);
        assert!(p.density[1] > 1000.0);
    }

    #[test]
    fn positions_advance_half_per_relaxation_half_step() {
        let (mut store, index, id, rel) = fluid_patch();
        let v = Vec2::new(1.0, 0.0);
        for vel in &mut store.get_mut(id).unwrap().particles.velocity {
            *vel = v;
        }
        let x0 = store.get(id).unwrap().particles.position[0];
        let dt = 1e-3;
        // Density relaxation moves positions by v·dt/2 and leaves
        // velocity untouched for a uniformly translating patch.
        let mut op = DensityRelaxation::new(id, rel);
        op.execute(&mut store, &index, dt).unwrap();
        let x1 = store.get(id).unwrap().particles.position[0];
        assert_relative_eq!(x1.x - x0.x, 0.5 * dt, epsilon = 1e-12);
    }

    #[test]
    fn damping_contracts_velocity_spread() {
        let (mut store, index, id, rel) = fluid_patch();
        {
            let p = &mut store.get_mut(id).unwrap().particles;
            for (i, v) in p.velocity.iter_mut().enumerate() {
                *v = Vec2::new(if i % 2 == 0 { 1.0 } else { -1.0 }, 0.0);
            }
        }
        let spread_before = velocity_spread(&store, id);
        let mut op = Damping::new(id, rel, 50.0);
        op.execute(&mut store, &index, 1e-2).unwrap();
        let spread_after = velocity_spread(&store, id);
        assert!(spread_after < spread_before);
    }

    fn velocity_spread(store: &BodyStore, id: BodyId) -> f64 {
        let p = &store.get(id).unwrap().particles;
        let max = p.velocity.iter().map(|v| v.x).fold(f64::MIN, f64::max);
        let min = p.velocity.iter().map(|v| v.x).fold(f64::MAX, f64::min);
        max - min
    }

    #[test]
    fn missing_relation_is_reported() {
        let (mut store, index, id, _) = fluid_patch();
        let mut op = DensitySummation::new(id, RelationId(9));
        let err = op.execute(&mut store, &index, 0.0).unwrap_err();
        assert_eq!(
            err,
            OperatorError::MissingRelation {
                relation: RelationId(9)
            }
        );
    }

    struct Probe {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Operator for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn execute(
            &mut self,
            _bodies: &mut BodyStore,
            _index: &NeighborIndex,
            dt: f64,
        ) -> Result<(), OperatorError> {
            self.log.lock().unwrap().push(format!("probe dt={dt}"));
            Ok(())
        }
    }

    #[test]
    fn post_processes_run_with_the_same_step_size() {
        let (mut store, index, id, rel) = fluid_patch();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut op = DensitySummation::new(id, rel);
        op.push_post_process(Box::new(Probe { log: log.clone() }));
        op.push_post_process(Box::new(Probe { log: log.clone() }));
        op.execute(&mut store, &index, 0.25).unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["probe dt=0.25", "probe dt=0.25"]
        );
    }
}
