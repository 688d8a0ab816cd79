//! Per-shape colour palettes.
//!
//! One declarative table, one sampler. Sampling is random where the palette
//! asks for it, so callers should check range membership, not exact values.

use glam::Vec3;
use rand::Rng;

use crate::math::hsv_to_rgb;
use crate::shapes::Shape;

/// Inclusive `[min, max]` per RGB channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelRanges {
    pub r: [f32; 2],
    pub g: [f32; 2],
    pub b: [f32; 2],
}

impl ChannelRanges {
    pub const fn new(r: [f32; 2], g: [f32; 2], b: [f32; 2]) -> Self {
        Self { r, g, b }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            rng.gen_range(self.r[0]..=self.r[1]),
            rng.gen_range(self.g[0]..=self.g[1]),
            rng.gen_range(self.b[0]..=self.b[1]),
        )
    }

    pub fn contains(&self, c: Vec3) -> bool {
        let within = |v: f32, [lo, hi]: [f32; 2]| v >= lo - 1e-6 && v <= hi + 1e-6;
        within(c.x, self.r) && within(c.y, self.g) && within(c.z, self.b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Palette {
    /// Random pick among brand swatches, each channel jittered by `jitter`.
    Brand {
        swatches: &'static [[f32; 3]],
        jitter: f32,
    },
    /// Uniform sample per channel.
    Ranges(ChannelRanges),
    /// Hue sweeps once around the wheel across the particle indices.
    Rainbow { saturation: f32, value: f32 },
    /// First half of the indices samples the first range, second half the
    /// other.
    Strands([ChannelRanges; 2]),
}

pub const BRAND_SWATCHES: [[f32; 3]; 3] = [
    [0.42, 0.36, 0.91],
    [0.26, 0.55, 0.98],
    [0.67, 0.33, 0.97],
];

pub const TORUS_RANGES: ChannelRanges = ChannelRanges::new([0.0, 0.3], [0.6, 0.9], [0.8, 1.0]);
pub const CUBE_RANGES: ChannelRanges = ChannelRanges::new([0.9, 1.0], [0.45, 0.75], [0.0, 0.2]);
pub const HELIX_STRAND_RANGES: [ChannelRanges; 2] = [
    ChannelRanges::new([0.9, 1.0], [0.2, 0.45], [0.5, 0.75]),
    ChannelRanges::new([0.1, 0.3], [0.5, 0.8], [0.9, 1.0]),
];

impl Palette {
    pub fn for_shape(shape: Shape) -> Palette {
        match shape {
            Shape::Sphere => Palette::Brand {
                swatches: &BRAND_SWATCHES,
                jitter: 0.08,
            },
            Shape::Torus => Palette::Ranges(TORUS_RANGES),
            Shape::Cube => Palette::Ranges(CUBE_RANGES),
            Shape::Blob => Palette::Rainbow {
                saturation: 0.75,
                value: 1.0,
            },
            Shape::Helix => Palette::Strands(HELIX_STRAND_RANGES),
        }
    }

    /// Colour for particle `i` of `count`, clamped to [0,1].
    pub fn sample<R: Rng + ?Sized>(&self, i: usize, count: usize, rng: &mut R) -> Vec3 {
        let color = match *self {
            Palette::Brand { swatches, jitter } => {
                if swatches.is_empty() {
                    Vec3::ONE
                } else {
                    let base = Vec3::from_array(swatches[rng.gen_range(0..swatches.len())]);
                    let j = jitter.abs();
                    base + Vec3::new(
                        rng.gen_range(-j..=j),
                        rng.gen_range(-j..=j),
                        rng.gen_range(-j..=j),
                    )
                }
            }
            Palette::Ranges(ranges) => ranges.sample(rng),
            Palette::Rainbow { saturation, value } => {
                hsv_to_rgb(i as f32 / count.max(1) as f32, saturation, value)
            }
            Palette::Strands(strands) => {
                let strand = usize::from(i >= count / 2);
                strands[strand].sample(rng)
            }
        };
        color.clamp(Vec3::ZERO, Vec3::ONE)
    }
}

/// Fill `out` with colours for `shape`, treating `out.len()` as the count.
pub fn generate_colors<R: Rng + ?Sized>(shape: Shape, out: &mut [Vec3], rng: &mut R) {
    let palette = Palette::for_shape(shape);
    let count = out.len();
    for (i, c) in out.iter_mut().enumerate() {
        *c = palette.sample(i, count, rng);
    }
}

/// Per-particle render sizes: `base` scaled by a random factor in [0.8, 1.2].
pub fn generate_sizes<R: Rng + ?Sized>(base: f32, out: &mut [f32], rng: &mut R) {
    for s in out.iter_mut() {
        *s = base * rng.gen_range(0.8..=1.2);
    }
}
