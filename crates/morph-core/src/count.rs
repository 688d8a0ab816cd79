//! Particle-count policy: how many particles each shape gets on this device,
//! and whether the buffer must be resized before a morph.

use crate::config::{DensityConfig, ShapeTable, MAX_PARTICLE_COUNT};
use crate::shapes::geometry::HELIX_GROUP;
use crate::shapes::Shape;

/// What the host could tell us about the device. Any field may be missing
/// outside a browser.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceProfile {
    pub pixel_ratio: Option<f32>,
    /// Viewport `(width, height)` in CSS pixels.
    pub viewport: Option<(f32, f32)>,
    /// Low-power / mobile device.
    pub constrained: bool,
}

impl DeviceProfile {
    pub fn new(pixel_ratio: f32, width: f32, height: f32, constrained: bool) -> Self {
        Self {
            pixel_ratio: Some(pixel_ratio),
            viewport: Some((width, height)),
            constrained,
        }
    }

    /// Density factor for this device. Unusable inputs fall back to the
    /// configured defaults; the result is always finite and in bounds.
    pub fn density_factor(&self, config: &DensityConfig) -> f32 {
        let [ref_w, ref_h] = config.reference_viewport;
        let area_factor = match self.viewport {
            Some((w, h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => {
                ((w * h) / (ref_w * ref_h)).sqrt()
            }
            Some(_) => {
                log::warn!("ignoring unusable viewport {:?}", self.viewport);
                1.0
            }
            None => 1.0,
        };
        // High-DPI screens get slightly more particles.
        let ratio_factor = match self.pixel_ratio {
            Some(r) if r.is_finite() && r > 0.0 => 1.0 + (r.min(2.0) - 1.0).max(0.0) * 0.25,
            _ => 1.0,
        };
        let mut factor = config.default_density * area_factor * ratio_factor;
        if self.constrained {
            factor *= config.constrained_factor;
        }
        sanitize_density(factor, config)
    }
}

/// Clamp a raw density factor into the configured bounds. Non-finite or
/// non-positive values become the default.
pub fn sanitize_density(factor: f32, config: &DensityConfig) -> f32 {
    if !factor.is_finite() || factor <= 0.0 {
        log::warn!("density factor {factor} unusable, using {}", config.default_density);
        return config.default_density.clamp(config.min_density, config.max_density);
    }
    factor.clamp(config.min_density, config.max_density)
}

/// The single place optimal particle counts are computed.
#[derive(Clone, Debug, Default)]
pub struct ParticleCountPolicy {
    shapes: ShapeTable,
    density: DensityConfig,
}

impl ParticleCountPolicy {
    pub fn new(shapes: ShapeTable, density: DensityConfig) -> Self {
        Self { shapes, density }
    }

    /// Optimal count for `shape`. Torus counts are perfect squares, cube
    /// counts are six perfect squares and helix counts are multiples of 12.
    /// Never exceeds [`MAX_PARTICLE_COUNT`].
    pub fn optimal_count(&self, shape: Shape, density_factor: f32) -> usize {
        let density = sanitize_density(density_factor, &self.density);
        let scaled = (self.shapes.base_count(shape) as f32 * density).min(MAX_PARTICLE_COUNT as f32);
        let min_count = self.density.min_count.clamp(1, MAX_PARTICLE_COUNT) as usize;

        match shape {
            Shape::Torus => {
                let g = (scaled.sqrt().round() as usize).max(4);
                g * g
            }
            Shape::Cube => {
                let s = ((scaled / 6.0).sqrt().round() as usize).max(2);
                6 * s * s
            }
            Shape::Helix => {
                let count = (scaled.round() as usize).max(min_count).max(HELIX_GROUP);
                count / HELIX_GROUP * HELIX_GROUP
            }
            Shape::Sphere | Shape::Blob => (scaled.round() as usize).max(min_count),
        }
    }

    pub fn should_resize(&self, current_count: usize, shape: Shape, density_factor: f32) -> bool {
        current_count != self.optimal_count(shape, density_factor)
    }
}
