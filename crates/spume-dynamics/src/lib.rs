//! Physics operators and step-size estimators.
//!
//! Everything that advances particle state lives here, behind the
//! [`Operator`] trait; everything that bounds how far a step may
//! advance lives behind [`StepEstimator`]. The scheduler in
//! `spume-engine` composes these without knowing which physics it is
//! running — it only knows the invocation order and which clock each
//! operator belongs to.
//!
//! The interaction weights are a simple compactly-supported cubic of
//! the inter-particle distance (see [`kernel`]); they are normalized
//! away by the summation forms the operators use, so no kernel
//! constants appear anywhere.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod confinement;
pub mod coupling;
pub mod estimator;
pub mod fluid;
pub mod kernel;
pub mod operator;
pub mod solid;

pub use confinement::{HalfPlane, SignedSurface, StaticConfinement};
pub use coupling::PressureForceOnSolid;
pub use estimator::{
    AcousticTimeStep, AdvectionTimeStep, SolidAcousticTimeStep, StepEstimator,
};
pub use fluid::{
    Damping, DensityRelaxation, DensitySummation, GravityInitialization, PressureRelaxation,
};
pub use operator::{AveragingBracket, Operator};
pub use solid::{
    AverageVelocity, ConstrainRegion, StressRelaxationFirstHalf, StressRelaxationSecondHalf,
    UpdateNormals,
};
