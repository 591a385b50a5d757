//! Spume: a multi-rate coupled particle simulation engine for
//! weakly-compressible fluids and elastic solids.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all spume sub-crates. For most users, adding `spume` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use spume::prelude::*;
//!
//! // A 3×3 water patch at rest on a lattice.
//! let spacing = 0.1;
//! let mut positions = Vec::new();
//! for gy in 0..3 {
//!     for gx in 0..3 {
//!         positions.push(Vec2::new(gx as f64 * spacing, gy as f64 * spacing));
//!     }
//! }
//! let mut bodies = BodyStore::new();
//! let water = bodies.push(Body::new(
//!     "water",
//!     BodyKind::Fluid,
//!     Material::weakly_compressible(1000.0, 1.0),
//!     1.3 * spacing,
//!     ParticleArrays::at_rest(positions, 1000.0, spacing),
//! ));
//! let inner = RelationId(0);
//!
//! // A short pure-fluid run under gravity.
//! let config = SchedulerConfig {
//!     end_time: 0.01,
//!     output_interval: 0.01,
//!     screen_output_interval: 1_000_000,
//!     observation_sample_interval: 1_000_000,
//!     restart_output_interval: 1_000_000,
//!     relations: vec![(inner, Relation::Inner { body: water })],
//!     moving_bodies: vec![water],
//!     fluid: FluidPhase {
//!         advection_estimator: Box::new(AdvectionTimeStep::new(water)),
//!         acoustic_estimator: Box::new(AcousticTimeStep::new(water)),
//!         prepare: vec![Box::new(GravityInitialization::new(
//!             water,
//!             Vec2::new(0.0, -9.81),
//!         ))],
//!         update_density: vec![Box::new(DensitySummation::new(water, inner))],
//!         damping: vec![],
//!         pressure_relaxation: vec![Box::new(PressureRelaxation::new(water, inner))],
//!         density_relaxation: vec![Box::new(DensityRelaxation::new(water, inner))],
//!     },
//!     solid: None,
//!     output_recorders: vec![],
//!     observation_recorders: vec![],
//!     restart: None,
//! };
//!
//! let mut scheduler = Scheduler::new(config, bodies).unwrap();
//! let metrics = scheduler.run().unwrap();
//! assert!(metrics.acoustic_steps > 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `spume-core` | IDs, the simulation clock, error taxonomy |
//! | [`body`] | `spume-body` | Bodies, materials, particle arrays, relations |
//! | [`index`] | `spume-index` | Cell grids and neighbor lists |
//! | [`dynamics`] | `spume-dynamics` | Physics operators and step-size estimators |
//! | [`io`] | `spume-io` | Recorders and restart snapshots |
//! | [`engine`] | `spume-engine` | The coupling scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core IDs, the simulation clock, and the error taxonomy
/// (`spume-core`).
pub use spume_core as types;

/// Bodies, materials, particle arrays, and relations (`spume-body`).
///
/// [`body::BodyStore`] holds every body in a run; [`body::Relation`]
/// declares which bodies interact.
pub use spume_body as body;

/// Cell grids and per-relation neighbor lists (`spume-index`).
pub use spume_index as index;

/// Physics operators and step-size estimators (`spume-dynamics`).
///
/// The [`dynamics::Operator`] and [`dynamics::StepEstimator`] traits
/// are the main extension points for user-defined physics.
pub use spume_dynamics as dynamics;

/// Recorders and restart snapshots (`spume-io`).
pub use spume_io as io;

/// The coupling scheduler (`spume-engine`).
///
/// [`engine::Scheduler`] drives the nested multi-rate loop described
/// by [`engine::SchedulerConfig`].
pub use spume_engine as engine;

/// Common imports for typical spume usage.
///
/// ```rust
/// use spume::prelude::*;
/// ```
///
/// This imports the most frequently used types: bodies and materials,
/// IDs, the built-in operators and estimators, recorders, and the
/// scheduler.
pub mod prelude {
    // IDs and errors
    pub use spume_core::{BodyId, EstimateError, OperatorError, RelationId, StepError};

    // Bodies and relations
    pub use spume_body::{
        Body, BodyKind, BodyStore, Material, ParticleArrays, Relation, Vec2,
    };

    // Neighbor index
    pub use spume_index::NeighborIndex;

    // Traits
    pub use spume_dynamics::{AveragingBracket, Operator, StepEstimator};

    // Estimators
    pub use spume_dynamics::{AcousticTimeStep, AdvectionTimeStep, SolidAcousticTimeStep};

    // Fluid operators and confinement
    pub use spume_dynamics::{
        Damping, DensityRelaxation, DensitySummation, GravityInitialization, HalfPlane,
        PressureRelaxation, StaticConfinement,
    };

    // Solid operators and coupling
    pub use spume_dynamics::{
        AverageVelocity, ConstrainRegion, PressureForceOnSolid, StressRelaxationFirstHalf,
        StressRelaxationSecondHalf, UpdateNormals,
    };

    // Recording and restart
    pub use spume_io::{
        BodyStatesRecorder, MechanicalEnergyRecorder, ObservedParticleRecorder, RecordContext,
        Recorder, RestartHeader, RestartIo,
    };

    // Scheduler
    pub use spume_engine::{
        FluidPhase, RunError, RunMetrics, Scheduler, SchedulerConfig, SolidCoupling,
        SolidStepPolicy,
    };
}
