//! Position-based cloth simulation.
//!
//! A grid of point masses is advanced with Verlet integration, held together
//! by iteratively projected Distance, Bend and Volume constraints, and kept
//! out of spheres, boxes, planes and triangle meshes. [`ClothSimulator`] is
//! the entry point.
//!
//! Enable the `parallel` feature to run force accumulation, primitive
//! collision and colored constraint batches on rayon.

pub mod collision;
pub mod config;
pub mod constraints;
pub mod error;
pub mod forces;
pub mod grid;
pub mod integrator;
pub mod materials;
pub mod math;
pub mod normals;
pub mod particle;
pub mod persist;
pub mod quality;
pub mod simulator;

pub use collision::{CollisionPrimitive, Shape};
pub use config::SimulationConfig;
pub use constraints::{Constraint, ConstraintKind};
pub use error::{ClothError, ClothResult};
pub use forces::registry::{CustomForce, ParticleSample};
pub use forces::wind::WindField;
pub use materials::ClothPreset;
pub use particle::Particle;
pub use quality::StepStats;
pub use simulator::{ClothSimulator, SimulationState};
