//! Shape identifiers, geometry generators and colour palettes.
//!
//! Geometry is pure and deterministic; colours are the one intentionally
//! random part of the engine.

pub mod geometry;
pub mod palette;

use std::fmt;
use std::str::FromStr;

use crate::error::ShapeParseError;

/// One of the five point-cloud forms the engine morphs between.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Shape {
    #[default]
    Sphere,
    Torus,
    Cube,
    Blob,
    Helix,
}

impl Shape {
    pub const ALL: [Shape; 5] = [
        Shape::Sphere,
        Shape::Torus,
        Shape::Cube,
        Shape::Blob,
        Shape::Helix,
    ];

    /// Time-parameterised shapes are regenerated every frame while idle.
    pub fn is_animated(self) -> bool {
        matches!(self, Shape::Blob | Shape::Helix)
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Torus => "torus",
            Shape::Cube => "cube",
            Shape::Blob => "blob",
            Shape::Helix => "helix",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = ShapeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name() == name)
            .ok_or_else(|| ShapeParseError(s.to_string()))
    }
}
