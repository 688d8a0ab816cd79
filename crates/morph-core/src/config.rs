//! Static configuration table: per-shape geometry, morph timings, scroll
//! hysteresis and device density bounds.

use crate::error::ConfigError;
use crate::morph::Transition;
use crate::shapes::Shape;

/// Upper bound for any particle count, configured or density-scaled.
pub const MAX_PARTICLE_COUNT: u32 = 100_000;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SphereSpec {
    pub radius: f32,
    pub base_count: u32,
    pub point_size: f32,
}

impl Default for SphereSpec {
    fn default() -> Self {
        Self {
            radius: 1.5,
            base_count: 1800,
            point_size: 0.035,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TorusSpec {
    pub major_radius: f32,
    pub minor_radius: f32,
    /// Rounded to a perfect square by the count policy.
    pub base_count: u32,
    pub point_size: f32,
}

impl Default for TorusSpec {
    fn default() -> Self {
        Self {
            major_radius: 1.2,
            minor_radius: 0.45,
            base_count: 2025,
            point_size: 0.032,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CubeSpec {
    /// Edge length.
    pub size: f32,
    /// Rounded to 6 * k^2 by the count policy.
    pub base_count: u32,
    pub point_size: f32,
}

impl Default for CubeSpec {
    fn default() -> Self {
        Self {
            size: 2.2,
            base_count: 2400,
            point_size: 0.03,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlobSpec {
    pub radius: f32,
    /// Amplitudes of the three deformation waves, lowest frequency first.
    pub wave_amplitudes: [f32; 3],
    /// Phase speed of the waves in radians per second.
    pub wave_speed: f32,
    pub base_count: u32,
    pub point_size: f32,
}

impl Default for BlobSpec {
    fn default() -> Self {
        Self {
            radius: 1.4,
            wave_amplitudes: [0.2, 0.1, 0.05],
            wave_speed: 0.8,
            base_count: 2000,
            point_size: 0.034,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HelixSpec {
    pub radius: f32,
    pub height: f32,
    pub turns: f32,
    /// Distance between the two strand axes along X.
    pub separation: f32,
    /// Radius of the six-filament tube around each strand.
    pub tube_radius: f32,
    /// Twist speed in radians per second.
    pub spin: f32,
    /// Rounded down to a multiple of 12 by the count policy.
    pub base_count: u32,
    pub point_size: f32,
}

impl Default for HelixSpec {
    fn default() -> Self {
        Self {
            radius: 0.6,
            height: 3.2,
            turns: 3.0,
            separation: 0.4,
            tube_radius: 0.08,
            spin: 0.15,
            base_count: 1800,
            point_size: 0.03,
        }
    }
}

/// Geometry constants for all five shapes.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShapeTable {
    pub sphere: SphereSpec,
    pub torus: TorusSpec,
    pub cube: CubeSpec,
    pub blob: BlobSpec,
    pub helix: HelixSpec,
}

impl ShapeTable {
    /// Optimal count before device scaling.
    pub fn base_count(&self, shape: Shape) -> u32 {
        match shape {
            Shape::Sphere => self.sphere.base_count,
            Shape::Torus => self.torus.base_count,
            Shape::Cube => self.cube.base_count,
            Shape::Blob => self.blob.base_count,
            Shape::Helix => self.helix.base_count,
        }
    }

    pub fn point_size(&self, shape: Shape) -> f32 {
        match shape {
            Shape::Sphere => self.sphere.point_size,
            Shape::Torus => self.torus.point_size,
            Shape::Cube => self.cube.point_size,
            Shape::Blob => self.blob.point_size,
            Shape::Helix => self.helix.point_size,
        }
    }

    /// Radius of a ball centred on the origin that contains every point the
    /// shape's generator can produce.
    pub fn bounding_radius(&self, shape: Shape) -> f32 {
        match shape {
            Shape::Sphere => self.sphere.radius,
            Shape::Torus => self.torus.major_radius + self.torus.minor_radius,
            Shape::Cube => self.cube.size * 0.5 * 3.0_f32.sqrt(),
            Shape::Blob => {
                let [a, b, c] = self.blob.wave_amplitudes;
                self.blob.radius * (1.0 + a.abs() + b.abs() + c.abs())
            }
            Shape::Helix => {
                let h = &self.helix;
                let planar = h.radius + h.separation * 0.5 + h.tube_radius;
                (planar * planar + h.height * h.height * 0.25).sqrt()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("sphere.radius", self.sphere.radius)?;
        positive("torus.major_radius", self.torus.major_radius)?;
        positive("torus.minor_radius", self.torus.minor_radius)?;
        positive("cube.size", self.cube.size)?;
        positive("blob.radius", self.blob.radius)?;
        positive("helix.radius", self.helix.radius)?;
        positive("helix.height", self.helix.height)?;
        positive("helix.turns", self.helix.turns)?;
        non_negative("helix.separation", self.helix.separation)?;
        non_negative("helix.tube_radius", self.helix.tube_radius)?;
        finite("helix.spin", self.helix.spin)?;
        finite("blob.wave_speed", self.blob.wave_speed)?;
        for amplitude in self.blob.wave_amplitudes {
            finite("blob.wave_amplitudes", amplitude)?;
        }
        for shape in Shape::ALL {
            positive("point_size", self.point_size(shape))?;
            positive("base_count", self.base_count(shape) as f32)?;
            at_most("base_count", self.base_count(shape), MAX_PARTICLE_COUNT)?;
        }
        Ok(())
    }
}

/// Timings and strengths of the morph transitions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MorphConfig {
    /// Transition used by a plain `morph_to`.
    pub default_transition: Transition,
    /// Duration of a [`Transition::Blend`] in seconds.
    pub blend_duration: f32,
    pub explosion_duration: f32,
    /// Whole-cloud scale reached at the end of the explosion.
    pub explosion_scale: f32,
    /// Maximum per-particle displacement during the explosion.
    pub dispersion_strength: f32,
    /// Full turns of the cloud during the explosion. Whole numbers keep the
    /// rotation reset at recomposition invisible.
    pub explosion_turns: u32,
    pub shake_count: u32,
    pub shake_duration: f32,
    pub shake_amplitude: f32,
    pub pause_duration: f32,
    pub recompose_duration: f32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            default_transition: Transition::Choreographed,
            blend_duration: 1.2,
            explosion_duration: 1.0,
            explosion_scale: 4.0,
            dispersion_strength: 1.2,
            explosion_turns: 3,
            shake_count: 3,
            shake_duration: 0.12,
            shake_amplitude: 0.15,
            pause_duration: 0.25,
            recompose_duration: 1.6,
        }
    }
}

impl MorphConfig {
    /// Total length of a choreographed morph.
    pub fn choreography_duration(&self) -> f32 {
        self.explosion_duration
            + self.shake_count as f32 * self.shake_duration
            + self.pause_duration
            + self.recompose_duration
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("morph.blend_duration", self.blend_duration)?;
        positive("morph.explosion_duration", self.explosion_duration)?;
        positive("morph.recompose_duration", self.recompose_duration)?;
        non_negative("morph.shake_duration", self.shake_duration)?;
        non_negative("morph.pause_duration", self.pause_duration)?;
        non_negative("morph.dispersion_strength", self.dispersion_strength)?;
        non_negative("morph.shake_amplitude", self.shake_amplitude)?;
        if !(self.explosion_scale >= 1.0 && self.explosion_scale.is_finite()) {
            return Err(ConfigError::ExplosionScale(self.explosion_scale));
        }
        Ok(())
    }
}

/// Scroll hysteresis thresholds, as fractions of the viewport height
/// measured from its top edge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TriggerConfig {
    /// Scrolling down: a section activates once its top rises to this line.
    pub forward: f32,
    /// Scrolling up: an active section deactivates once its top falls back
    /// below this line.
    pub backward: f32,
    /// Extra uniform scale at full section progress.
    pub separation_strength: f32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            forward: 0.2,
            backward: 0.6,
            separation_strength: 0.35,
        }
    }
}

impl TriggerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        unit("trigger.forward", self.forward)?;
        unit("trigger.backward", self.backward)?;
        non_negative("trigger.separation_strength", self.separation_strength)?;
        if self.forward >= self.backward {
            return Err(ConfigError::InvertedHysteresis {
                forward: self.forward,
                backward: self.backward,
            });
        }
        Ok(())
    }
}

/// Bounds for the device density factor that scales particle counts.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DensityConfig {
    /// Used when the host cannot report a usable factor.
    pub default_density: f32,
    pub min_density: f32,
    pub max_density: f32,
    /// Multiplier applied on constrained devices.
    pub constrained_factor: f32,
    /// Viewport considered density 1.0.
    pub reference_viewport: [f32; 2],
    /// Floor for any shape's particle count.
    pub min_count: u32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            default_density: 1.0,
            min_density: 0.25,
            max_density: 2.0,
            constrained_factor: 0.6,
            reference_viewport: [1920.0, 1080.0],
            min_count: 12,
        }
    }
}

impl DensityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("density.default_density", self.default_density)?;
        positive("density.min_density", self.min_density)?;
        positive("density.max_density", self.max_density)?;
        positive("density.constrained_factor", self.constrained_factor)?;
        positive("density.reference_viewport.width", self.reference_viewport[0])?;
        positive("density.reference_viewport.height", self.reference_viewport[1])?;
        at_most("density.min_count", self.min_count, MAX_PARTICLE_COUNT)?;
        if self.min_density > self.max_density {
            return Err(ConfigError::InvertedDensity {
                min: self.min_density,
                max: self.max_density,
            });
        }
        Ok(())
    }
}

/// Everything the engine and scroll controller need, in one table.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub shapes: ShapeTable,
    pub morph: MorphConfig,
    pub trigger: TriggerConfig,
    pub density: DensityConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shapes.validate()?;
        self.morph.validate()?;
        self.trigger.validate()?;
        self.density.validate()
    }

    /// Returns `self` if valid, otherwise logs the problem and falls back to
    /// the defaults.
    pub fn validated_or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                log::warn!("invalid engine config ({err}), using defaults");
                Self::default()
            }
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn at_most(field: &'static str, value: u32, max: u32) -> Result<(), ConfigError> {
    if value <= max {
        Ok(())
    } else {
        Err(ConfigError::TooLarge { field, value, max })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}
