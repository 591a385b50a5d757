//! Structure-of-arrays particle storage.

use crate::Vec2;

/// Per-particle field arrays for one body.
///
/// All arrays have the same length. Operators mutate these fields in
/// place; the scheduler never touches them directly — it only supplies
/// step sizes and invocation order.
#[derive(Clone, Debug, Default)]
pub struct ParticleArrays {
    /// Particle positions.
    pub position: Vec<Vec2>,
    /// Positions in the initial (reference) configuration; read by the
    /// solid stress relaxation operators, never updated afterwards.
    pub reference_position: Vec<Vec2>,
    /// Particle velocities.
    pub velocity: Vec<Vec2>,
    /// Accumulated acceleration for the current sub-step (gravity,
    /// viscous and pressure contributions).
    pub acceleration: Vec<Vec2>,
    /// Time-averaged velocity over one acoustic step, produced by the
    /// averaging bracket for FSI force sampling.
    pub velocity_average: Vec<Vec2>,
    /// Force exerted by fluid pressure, written by the force-transfer
    /// operator onto solid particles.
    pub force_from_fluid: Vec<Vec2>,
    /// Outward surface normal (solids and walls).
    pub normal: Vec<Vec2>,
    /// Mass density.
    pub density: Vec<f64>,
    /// Pressure.
    pub pressure: Vec<f64>,
    /// Particle volume.
    pub volume: Vec<f64>,
    /// Particle mass.
    pub mass: Vec<f64>,
    /// Region-constraint tag; constrained particles are held fixed by
    /// the constraint operator.
    pub constrained: Vec<bool>,
}

impl ParticleArrays {
    /// Build arrays for particles at `positions`, all fields at rest.
    ///
    /// Each particle is assigned `rest_density`, volume `spacing²`,
    /// and mass `rest_density * spacing²`. Kinematic fields start at
    /// zero and no particle is constrained.
    pub fn at_rest(positions: Vec<Vec2>, rest_density: f64, spacing: f64) -> Self {
        let n = positions.len();
        let volume = spacing * spacing;
        Self {
            reference_position: positions.clone(),
            position: positions,
            velocity: vec![Vec2::zeros(); n],
            acceleration: vec![Vec2::zeros(); n],
            velocity_average: vec![Vec2::zeros(); n],
            force_from_fluid: vec![Vec2::zeros(); n],
            normal: vec![Vec2::zeros(); n],
            density: vec![rest_density; n],
            pressure: vec![0.0; n],
            volume: vec![volume; n],
            mass: vec![rest_density * volume; n],
            constrained: vec![false; n],
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Whether the body holds zero particles.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Largest velocity magnitude across all particles.
    ///
    /// Returns 0.0 for an empty body. NaN velocities propagate into
    /// the result; estimators check for them separately.
    pub fn max_speed(&self) -> f64 {
        self.velocity.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    /// Check that all arrays agree on length.
    ///
    /// Used in debug assertions when a body enters the store.
    pub fn is_consistent(&self) -> bool {
        let n = self.position.len();
        self.reference_position.len() == n
            && self.velocity.len() == n
            && self.acceleration.len() == n
            && self.velocity_average.len() == n
            && self.force_from_fluid.len() == n
            && self.normal.len() == n
            && self.density.len() == n
            && self.pressure.len() == n
            && self.volume.len() == n
            && self.mass.len() == n
            && self.constrained.len() == n
    }
}
