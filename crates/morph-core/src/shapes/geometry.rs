//! Position generators for the five morph targets.
//!
//! Every generator maps `(index, count, time)` to a point and is pure: the
//! same inputs always give the same position. Only blob and helix read
//! `time`. All of them tolerate `count` of 0 or 1.

use std::f32::consts::TAU;

use glam::Vec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{BlobSpec, CubeSpec, HelixSpec, ShapeTable, SphereSpec, TorusSpec};
use crate::math::{hash11, GOLDEN_RATIO};
use crate::shapes::Shape;

/// Filaments per helix strand.
pub const HELIX_FILAMENTS: usize = 6;
/// Particles per helix "row": two strands of six filaments.
pub const HELIX_GROUP: usize = 2 * HELIX_FILAMENTS;

/// Unit-radius Fibonacci lattice point.
pub fn fibonacci_point(i: usize, count: usize) -> Vec3 {
    if count <= 1 {
        return Vec3::Y;
    }
    let y = 1.0 - 2.0 * i as f32 / (count - 1) as f32;
    let r = (1.0 - y * y).max(0.0).sqrt();
    let theta = TAU * i as f32 / GOLDEN_RATIO;
    Vec3::new(theta.cos() * r, y, theta.sin() * r)
}

pub fn sphere(spec: &SphereSpec, i: usize, count: usize) -> Vec3 {
    fibonacci_point(i, count) * spec.radius
}

/// Torus on a `floor(sqrt(count))` square grid. Indices past the square wrap
/// back onto the grid.
pub fn torus(spec: &TorusSpec, i: usize, count: usize) -> Vec3 {
    let g = ((count as f64).sqrt().floor() as usize).max(1);
    let u = TAU * (i % g) as f32 / g as f32;
    let v = TAU * ((i / g) % g) as f32 / g as f32;
    let ring = spec.major_radius + spec.minor_radius * v.cos();
    Vec3::new(ring * u.cos(), ring * u.sin(), spec.minor_radius * v.sin())
}

/// (normal, u axis, v axis) for each cube face.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Cube surface: `count / 6` particles per face on a square grid, the last
/// face takes the remainder.
pub fn cube(spec: &CubeSpec, i: usize, count: usize) -> Vec3 {
    let per_face = count / 6;
    let (face, local, face_count) = if per_face == 0 {
        (i.min(5), 0, 1)
    } else {
        let face = (i / per_face).min(5);
        let face_count = if face == 5 { count - 5 * per_face } else { per_face };
        (face, i - face * per_face, face_count)
    };

    let g = ((face_count as f64).sqrt().ceil() as usize).max(1);
    let coord = |k: usize| {
        if g == 1 {
            0.0
        } else {
            (k as f32 / (g - 1) as f32 - 0.5) * spec.size
        }
    };

    let (normal, u_axis, v_axis) = CUBE_FACES[face];
    normal * (spec.size * 0.5) + u_axis * coord(local % g) + v_axis * coord(local / g)
}

/// Fibonacci sphere pushed in and out by three travelling waves of
/// decreasing amplitude.
pub fn blob(spec: &BlobSpec, i: usize, count: usize, time: f32) -> Vec3 {
    let p = fibonacci_point(i, count);
    let theta = p.z.atan2(p.x);
    let phi = p.y.clamp(-1.0, 1.0).acos();
    let t = time * spec.wave_speed;

    let wave1 = (3.0 * theta + t).sin() * (2.0 * phi + 0.7 * t).cos();
    let wave2 = (5.0 * theta - 1.3 * t).sin() * (4.0 * phi + t).sin();
    let wave3 = (7.0 * theta + 1.7 * t).cos() * (6.0 * phi - 0.9 * t).sin();
    let [a, b, c] = spec.wave_amplitudes;
    let morph_scale = 1.0 + a * wave1 + b * wave2 + c * wave3;

    p * spec.radius * morph_scale
}

/// Which strand (0 or 1) particle `i` belongs to. Independent of time.
pub fn helix_strand(i: usize, count: usize) -> usize {
    helix_slot(i, count).0
}

/// (strand, filament, progress along strand) for particle `i`.
fn helix_slot(i: usize, count: usize) -> (usize, usize, f32) {
    let per = count / HELIX_GROUP;
    let body = per * HELIX_GROUP;
    if i < body {
        let per_strand = per * HELIX_FILAMENTS;
        let strand = i / per_strand;
        let within = i % per_strand;
        let progress = if per > 1 {
            (within % per) as f32 / (per - 1) as f32
        } else {
            0.5
        };
        (strand, within / per, progress)
    } else {
        // Remainder particles land on a pseudo-random strand and height,
        // keyed on the index so they stay put from frame to frame.
        let strand = usize::from(hash11(i as f32 + 0.5) >= 0.5);
        let progress = hash11(i as f32 * 1.37 + 17.0);
        (strand, i % HELIX_FILAMENTS, progress)
    }
}

/// Two counter-rotating strands, each a tube of six filaments, twisting
/// with `time`.
pub fn helix(spec: &HelixSpec, i: usize, count: usize, time: f32) -> Vec3 {
    let (strand, filament, progress) = helix_slot(i, count);
    let sign = if strand == 0 { 1.0 } else { -1.0 };
    let rotation_offset = time * spec.spin;

    let t = progress * spec.turns * TAU;
    let angle = sign * (t + rotation_offset);
    let y = (progress - 0.5) * spec.height;

    let tube_angle = TAU * filament as f32 / HELIX_FILAMENTS as f32;
    let x = spec.radius * angle.cos()
        + sign * spec.separation * 0.5
        + spec.tube_radius * tube_angle.cos();
    let z = spec.radius * angle.sin() + spec.tube_radius * tube_angle.sin();
    Vec3::new(x, y, z)
}

/// Position of particle `i` of `count` on `shape`.
pub fn position(shapes: &ShapeTable, shape: Shape, i: usize, count: usize, time: f32) -> Vec3 {
    match shape {
        Shape::Sphere => sphere(&shapes.sphere, i, count),
        Shape::Torus => torus(&shapes.torus, i, count),
        Shape::Cube => cube(&shapes.cube, i, count),
        Shape::Blob => blob(&shapes.blob, i, count, time),
        Shape::Helix => helix(&shapes.helix, i, count, time),
    }
}

/// Fill every slot of `out` with `shape`, treating `out.len()` as the count.
pub fn generate_positions(shapes: &ShapeTable, shape: Shape, out: &mut [Vec3], time: f32) {
    let count = out.len();

    #[cfg(feature = "parallel")]
    {
        out.par_iter_mut()
            .enumerate()
            .for_each(|(i, p)| *p = position(shapes, shape, i, count, time));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (i, p) in out.iter_mut().enumerate() {
            *p = position(shapes, shape, i, count, time);
        }
    }
}
