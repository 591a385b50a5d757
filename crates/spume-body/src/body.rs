//! Body definitions and material scalars.

use crate::particles::ParticleArrays;

/// The kind of continuum a body represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Weakly-compressible fluid, advanced by the fluid relaxation
    /// operators at the acoustic step.
    Fluid,
    /// Deformable solid, advanced by the stress relaxation operators
    /// at its own (usually finer) acoustic step.
    Solid,
    /// Fictitious observer: holds probe points only, never advanced
    /// by any operator.
    Observer,
}

/// Material scalars the step-size estimators and relaxation operators
/// read. Constitutive detail beyond these scalars is a collaborator
/// concern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Reference (rest) density.
    pub rest_density: f64,
    /// Artificial sound speed; bounds pressure/stress wave propagation.
    pub sound_speed: f64,
    /// Characteristic velocity scale used by the advection bound.
    pub reference_velocity: f64,
}

impl Material {
    /// A weakly-compressible fluid material.
    ///
    /// The sound speed follows the usual weakly-compressible
    /// convention of ten times the characteristic velocity.
    pub fn weakly_compressible(rest_density: f64, reference_velocity: f64) -> Self {
        Self {
            rest_density,
            sound_speed: 10.0 * reference_velocity,
            reference_velocity,
        }
    }

    /// An elastic solid material with an explicitly given sound speed.
    pub fn elastic(rest_density: f64, sound_speed: f64) -> Self {
        Self {
            rest_density,
            sound_speed,
            reference_velocity: 0.0,
        }
    }
}

/// A named collection of particles of one kind.
///
/// Bodies are constructed once during setup and live for the whole
/// run; only their particle fields change afterwards.
#[derive(Clone, Debug)]
pub struct Body {
    /// Human-readable name used in diagnostics and recordings.
    pub name: String,
    /// What the body represents.
    pub kind: BodyKind,
    /// Material scalars.
    pub material: Material,
    /// Smoothing length; the neighbor search support radius is twice
    /// this value.
    pub smoothing_length: f64,
    /// The particle arrays.
    pub particles: ParticleArrays,
}

impl Body {
    /// Create a body, checking array consistency in debug builds.
    pub fn new(
        name: impl Into<String>,
        kind: BodyKind,
        material: Material,
        smoothing_length: f64,
        particles: ParticleArrays,
    ) -> Self {
        debug_assert!(particles.is_consistent(), "particle arrays disagree on length");
        debug_assert!(
            smoothing_length > 0.0,
            "smoothing length must be positive, got {smoothing_length}"
        );
        Self {
            name: name.into(),
            kind,
            material,
            smoothing_length,
            particles,
        }
    }

    /// The neighbor search support radius (twice the smoothing length).
    pub fn support_radius(&self) -> f64 {
        2.0 * self.smoothing_length
    }
}
