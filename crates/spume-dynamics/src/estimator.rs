//! Step-size estimators.
//!
//! Each estimator computes a stability bound for one body from its
//! current particle state. Estimators validate that state as they scan
//! it: a NaN velocity or non-positive density is an instability, and
//! the contract is to report it as an error rather than fold it into a
//! garbage bound. The scheduler treats every estimator error as fatal.

use spume_body::{Body, BodyStore};
use spume_core::{BodyId, EstimateError};

/// Produces a stability bound on the step size for one body.
pub trait StepEstimator: Send {
    /// Stable name used in error reports and diagnostics.
    fn name(&self) -> &str;

    /// The current bound, strictly positive and finite on success.
    fn estimate(&self, bodies: &BodyStore) -> Result<f64, EstimateError>;
}

/// Scan a body's kinematic state, returning its largest speed.
///
/// Shared by all estimators; this is where instability detection
/// happens, on the same pass that gathers the velocity scale.
fn checked_max_speed(id: BodyId, body: &Body) -> Result<f64, EstimateError> {
    let mut max_speed: f64 = 0.0;
    for (i, v) in body.particles.velocity.iter().enumerate() {
        if !v.x.is_finite() || !v.y.is_finite() {
            return Err(EstimateError::NonFiniteVelocity {
                body: id,
                particle: i,
            });
        }
        max_speed = max_speed.max(v.norm());
    }
    for (i, &rho) in body.particles.density.iter().enumerate() {
        if !(rho > 0.0) {
            return Err(EstimateError::NonPositiveDensity {
                body: id,
                particle: i,
                value: rho,
            });
        }
    }
    Ok(max_speed)
}

fn check_bound(id: BodyId, bound: f64) -> Result<f64, EstimateError> {
    if bound.is_finite() && bound > 0.0 {
        Ok(bound)
    } else {
        Err(EstimateError::NonPositiveBound {
            body: id,
            value: bound,
        })
    }
}

fn lookup(bodies: &BodyStore, id: BodyId) -> Result<&Body, EstimateError> {
    bodies.get(id).ok_or(EstimateError::MissingBody { body: id })
}

// ── Advection bound ────────────────────────────────────────────────

/// Bound on the coarse advection interval for a fluid body.
///
/// `Dt = cfl · h / max(|v|_max, u_ref)`: particles must not outrun the
/// neighbor lists between rebuilds. The reference velocity keeps the
/// bound finite for a fluid starting at rest.
#[derive(Clone, Debug)]
pub struct AdvectionTimeStep {
    body: BodyId,
    cfl: f64,
}

impl AdvectionTimeStep {
    /// Advection bound for `body` with the conventional factor 0.25.
    pub fn new(body: BodyId) -> Self {
        Self { body, cfl: 0.25 }
    }

    /// Override the advection safety factor.
    pub fn with_cfl(body: BodyId, cfl: f64) -> Self {
        debug_assert!(cfl > 0.0);
        Self { body, cfl }
    }
}

impl StepEstimator for AdvectionTimeStep {
    fn name(&self) -> &str {
        "fluid_advection"
    }

    fn estimate(&self, bodies: &BodyStore) -> Result<f64, EstimateError> {
        let body = lookup(bodies, self.body)?;
        let max_speed = checked_max_speed(self.body, body)?;
        let scale = max_speed.max(body.material.reference_velocity);
        check_bound(self.body, self.cfl * body.smoothing_length / scale)
    }
}

// ── Acoustic bound ─────────────────────────────────────────────────

/// Bound on the fluid acoustic (pressure-wave) step.
///
/// `dt = cfl · h / (c + |v|_max)`.
#[derive(Clone, Debug)]
pub struct AcousticTimeStep {
    body: BodyId,
    cfl: f64,
}

impl AcousticTimeStep {
    /// Acoustic bound for `body` with the conventional factor 0.6.
    pub fn new(body: BodyId) -> Self {
        Self { body, cfl: 0.6 }
    }

    /// Override the acoustic safety factor.
    pub fn with_cfl(body: BodyId, cfl: f64) -> Self {
        debug_assert!(cfl > 0.0);
        Self { body, cfl }
    }
}

impl StepEstimator for AcousticTimeStep {
    fn name(&self) -> &str {
        "fluid_acoustic"
    }

    fn estimate(&self, bodies: &BodyStore) -> Result<f64, EstimateError> {
        let body = lookup(bodies, self.body)?;
        let max_speed = checked_max_speed(self.body, body)?;
        let bound = self.cfl * body.smoothing_length / (body.material.sound_speed + max_speed);
        check_bound(self.body, bound)
    }
}

// ── Solid acoustic bound ───────────────────────────────────────────

/// Bound on the solid stress-wave step.
///
/// Same form as the fluid acoustic bound but evaluated against the
/// solid's (typically much larger) sound speed, which is why solids
/// sub-cycle inside the fluid acoustic step.
#[derive(Clone, Debug)]
pub struct SolidAcousticTimeStep {
    body: BodyId,
    cfl: f64,
}

impl SolidAcousticTimeStep {
    /// Solid acoustic bound for `body` with the conventional factor 0.6.
    pub fn new(body: BodyId) -> Self {
        Self { body, cfl: 0.6 }
    }
}

impl StepEstimator for SolidAcousticTimeStep {
    fn name(&self) -> &str {
        "solid_acoustic"
    }

    fn estimate(&self, bodies: &BodyStore) -> Result<f64, EstimateError> {
        let body = lookup(bodies, self.body)?;
        let max_speed = checked_max_speed(self.body, body)?;
        let bound = self.cfl * body.smoothing_length / (body.material.sound_speed + max_speed);
        check_bound(self.body, bound)
    }
}
