//! Bodies, particle storage, and relation descriptors.
//!
//! A [`Body`] is a named collection of particles of one kind (fluid,
//! solid, or fictitious observer) together with the material scalars
//! the step-size estimators need. Bodies live in a [`BodyStore`] and
//! are addressed by [`BodyId`](spume_core::BodyId). Topological
//! connections between bodies are declared as [`Relation`] values;
//! the neighbor lists themselves live in `spume-index`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod body;
pub mod particles;
pub mod relation;
pub mod store;

pub use body::{Body, BodyKind, Material};
pub use particles::ParticleArrays;
pub use relation::Relation;
pub use store::BodyStore;

/// 2-D vector used for all particle kinematics.
pub type Vec2 = nalgebra::Vector2<f64>;
