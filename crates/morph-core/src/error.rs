//! Error types for the morph engine.
//!
//! Steady-state operation never fails; these only surface when parsing shape
//! names coming from the host or validating a config override.

use thiserror::Error;

/// A shape name did not match any of the five supported shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shape '{0}' (expected sphere, torus, cube, blob or helix)")]
pub struct ShapeParseError(pub String);

/// An [`EngineConfig`](crate::config::EngineConfig) field is out of range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("forward threshold {forward} must be below backward threshold {backward}")]
    InvertedHysteresis { forward: f32, backward: f32 },
    #[error("min density {min} must not exceed max density {max}")]
    InvertedDensity { min: f32, max: f32 },
    #[error("explosion scale must be >= 1.0, got {0}")]
    ExplosionScale(f32),
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
}
