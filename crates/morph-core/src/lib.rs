//! Procedural particle morphing engine.
//!
//! Generates point clouds for five shapes, morphs a particle buffer between
//! them (including an explosion / recomposition choreography), adapts the
//! particle count per shape and device, and turns scroll positions into
//! morph commands with hysteresis.

pub mod config;
pub mod count;
pub mod error;
pub mod math;
pub mod morph;
pub mod particle;
pub mod shapes;
pub mod trigger;

pub use config::EngineConfig;
pub use count::{DeviceProfile, ParticleCountPolicy};
pub use error::{ConfigError, ShapeParseError};
pub use morph::{ChoreoPhase, CloudTransform, EngineEvent, MorphEngine, MorphState, Transition};
pub use particle::ParticleBuffer;
pub use shapes::Shape;
pub use trigger::{MorphCommand, ScrollTriggerController};
