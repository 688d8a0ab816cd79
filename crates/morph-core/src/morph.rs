//! Morph state machine.
//!
//! `Idle(shape) -> Morphing(from, to, progress) -> Idle(to)`, advanced only
//! by [`MorphEngine::tick`]. The choreographed transition is a phase enum
//! driven by elapsed time, so a test can replay it by feeding `dt`s.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::count::{DeviceProfile, ParticleCountPolicy};
use crate::math::{ease_out_cubic, ease_out_elastic, finite_or_zero, lerp, yoyo};
use crate::particle::ParticleBuffer;
use crate::shapes::geometry::generate_positions;
use crate::shapes::palette::{generate_colors, generate_sizes};
use crate::shapes::Shape;

/// Longest frame step the engine will integrate; longer hitches are clipped.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Fraction of the elastic overshoot kept when the cloud scale settles on 1.
const RECOMPOSE_OVERSHOOT: f32 = 0.25;

/// How a morph gets from the current buffer to the target shape.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Transition {
    /// Jump straight to the target. Also used to resync after a resize.
    Snap,
    /// Eased interpolation towards the (possibly moving) target.
    Blend,
    /// Explosion, shake, pause, then recomposition.
    Choreographed,
}

/// Phases of a [`Transition::Choreographed`] morph, in order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChoreoPhase {
    Explosion,
    Shake,
    Pause,
    Recomposition,
}

impl ChoreoPhase {
    fn next(self) -> Option<ChoreoPhase> {
        match self {
            ChoreoPhase::Explosion => Some(ChoreoPhase::Shake),
            ChoreoPhase::Shake => Some(ChoreoPhase::Pause),
            ChoreoPhase::Pause => Some(ChoreoPhase::Recomposition),
            ChoreoPhase::Recomposition => None,
        }
    }
}

/// Whole-cloud transform the renderer applies on top of the buffer.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CloudTransform {
    pub scale: f32,
    /// Rotation about +Y in radians.
    pub rotation: f32,
    pub offset: Vec3,
}

impl CloudTransform {
    pub const IDENTITY: CloudTransform = CloudTransform {
        scale: 1.0,
        rotation: 0.0,
        offset: Vec3::ZERO,
    };

    fn lerp(&self, other: &CloudTransform, t: f32) -> CloudTransform {
        CloudTransform {
            scale: lerp(self.scale, other.scale, t),
            rotation: lerp(self.rotation, other.rotation, t),
            offset: self.offset.lerp(other.offset, t),
        }
    }
}

impl Default for CloudTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Notifications for the rendering collaborator, drained with
/// [`MorphEngine::take_events`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EngineEvent {
    /// Arrays were replaced; rebind them and update the draw count.
    BuffersResized { count: usize },
    MorphStarted { from: Shape, to: Shape },
    MorphCompleted(Shape),
}

/// Externally visible engine state.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MorphState {
    Idle(Shape),
    Morphing { from: Shape, to: Shape, progress: f32 },
}

/// One in-flight morph. Dropped on completion or when superseded.
#[derive(Debug)]
struct MorphTransaction {
    from: Shape,
    to: Shape,
    transition: Transition,
    started_at: f32,
    elapsed: f32,
    duration: f32,
    color_snapshot: Vec<Vec3>,
    transform_start: CloudTransform,
    phase: ChoreoPhase,
    phase_elapsed: f32,
    /// Positions when the explosion began
    explosion_origin: Vec<Vec3>,
    /// Per-particle displacement reached at the end of the explosion
    dispersion: Vec<Vec3>,
    shake_dirs: Vec<Vec3>,
    /// Transform at the moment recomposition began
    recompose_from: CloudTransform,
}

pub struct MorphEngine {
    config: EngineConfig,
    policy: ParticleCountPolicy,
    buffer: ParticleBuffer,
    current_shape: Shape,
    density: f32,
    /// Monotonic seconds since the engine started
    clock: f32,
    /// `clock - anim_origin` is the time fed to animated generators
    anim_origin: f32,
    transform: CloudTransform,
    separation: f32,
    transaction: Option<MorphTransaction>,
    events: Vec<EngineEvent>,
    rng: StdRng,
}

impl MorphEngine {
    pub fn new(config: EngineConfig, initial: Shape, device: DeviceProfile) -> Self {
        Self::with_rng(config, initial, device, StdRng::from_entropy())
    }

    /// Same as [`MorphEngine::new`] but with reproducible colours and
    /// dispersion.
    pub fn with_seed(config: EngineConfig, initial: Shape, device: DeviceProfile, seed: u64) -> Self {
        Self::with_rng(config, initial, device, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, initial: Shape, device: DeviceProfile, mut rng: StdRng) -> Self {
        let config = config.validated_or_default();
        let policy = ParticleCountPolicy::new(config.shapes.clone(), config.density.clone());
        let density = device.density_factor(&config.density);
        let count = policy.optimal_count(initial, density);

        let mut buffer = ParticleBuffer::new(count);
        {
            let view = buffer.view_mut();
            generate_positions(&config.shapes, initial, view.positions, 0.0);
            generate_colors(initial, view.colors, &mut rng);
            generate_sizes(config.shapes.point_size(initial), view.sizes, &mut rng);
            view.target_positions.copy_from_slice(&*view.positions);
            view.target_colors.copy_from_slice(&*view.colors);
        }
        log::info!("morph engine started: {initial}, {count} particles, density {density:.2}");

        Self {
            config,
            policy,
            buffer,
            current_shape: initial,
            density,
            clock: 0.0,
            anim_origin: 0.0,
            transform: CloudTransform::IDENTITY,
            separation: 1.0,
            transaction: None,
            events: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policy(&self) -> &ParticleCountPolicy {
        &self.policy
    }

    pub fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    pub fn current_shape(&self) -> Shape {
        self.current_shape
    }

    /// Shape the engine is at or heading towards.
    pub fn target_shape(&self) -> Shape {
        self.transaction.as_ref().map_or(self.current_shape, |tx| tx.to)
    }

    pub fn is_morphing(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn particle_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn density_factor(&self) -> f32 {
        self.density
    }

    pub fn animation_clock(&self) -> f32 {
        self.clock
    }

    /// Time currently fed to the blob / helix generators.
    pub fn animation_time(&self) -> f32 {
        self.clock - self.anim_origin
    }

    pub fn positions(&self) -> &[f32] {
        self.buffer.positions_flat()
    }

    pub fn colors(&self) -> &[f32] {
        self.buffer.colors_flat()
    }

    pub fn sizes(&self) -> &[f32] {
        self.buffer.sizes()
    }

    pub fn cloud_transform(&self) -> CloudTransform {
        self.transform
    }

    pub fn separation(&self) -> f32 {
        self.separation
    }

    /// Uniform scroll-driven scale, independent of morphs. Unusable values
    /// reset it to identity.
    pub fn set_separation(&mut self, scale: f32) {
        self.separation = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    }

    /// Model matrix for the point cloud: translation * rotation * scale.
    pub fn model_matrix(&self) -> Mat4 {
        let t = &self.transform;
        Mat4::from_scale_rotation_translation(
            Vec3::splat(t.scale * self.separation),
            Quat::from_rotation_y(t.rotation),
            t.offset,
        )
    }

    pub fn phase(&self) -> Option<ChoreoPhase> {
        self.transaction
            .as_ref()
            .filter(|tx| tx.transition == Transition::Choreographed)
            .map(|tx| tx.phase)
    }

    pub fn state(&self) -> MorphState {
        match &self.transaction {
            None => MorphState::Idle(self.current_shape),
            Some(tx) => MorphState::Morphing {
                from: tx.from,
                to: tx.to,
                progress: (tx.elapsed / tx.duration).clamp(0.0, 1.0),
            },
        }
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Morph to `shape` with the configured default transition.
    pub fn morph_to(&mut self, shape: Shape) -> bool {
        self.morph_to_with(shape, self.config.morph.default_transition)
    }

    /// Start a morph towards `shape`. Returns `false` when the request is a
    /// no-op: already idle on `shape`, or already heading there. A
    /// [`Transition::Snap`] always applies, which makes it usable as a
    /// forced resize-sync. A request while morphing supersedes the
    /// in-flight transaction from wherever the buffer currently is.
    pub fn morph_to_with(&mut self, shape: Shape, transition: Transition) -> bool {
        if transition != Transition::Snap && self.target_shape() == shape {
            log::debug!("morph to {shape} ignored, already there");
            return false;
        }
        if let Some(tx) = self.transaction.take() {
            log::debug!(
                "superseding morph {} -> {} at {:.2}s",
                tx.from,
                tx.to,
                tx.elapsed
            );
        }

        self.resize_for(shape);

        if transition == Transition::Snap {
            self.snap_to(shape);
            return true;
        }

        let from = self.current_shape;
        let count = self.buffer.len();
        {
            let view = self.buffer.view_mut();
            generate_positions(&self.config.shapes, shape, view.target_positions, 0.0);
            generate_colors(shape, view.target_colors, &mut self.rng);
            generate_sizes(self.config.shapes.point_size(shape), view.sizes, &mut self.rng);
        }

        let morph = &self.config.morph;
        let (duration, explosion_origin, dispersion, shake_dirs) = match transition {
            Transition::Choreographed => {
                let strength = morph.dispersion_strength;
                let dispersion = (0..count)
                    .map(|_| random_in_unit_ball(&mut self.rng) * strength)
                    .collect();
                let shake_dirs = (0..morph.shake_count)
                    .map(|_| random_unit(&mut self.rng))
                    .collect();
                (
                    morph.choreography_duration(),
                    self.buffer.positions().to_vec(),
                    dispersion,
                    shake_dirs,
                )
            }
            _ => (morph.blend_duration, Vec::new(), Vec::new(), Vec::new()),
        };

        log::debug!("morph {from} -> {shape} ({transition:?}, {count} particles, {duration:.2}s)");
        self.events.push(EngineEvent::MorphStarted { from, to: shape });
        self.transaction = Some(MorphTransaction {
            from,
            to: shape,
            transition,
            started_at: self.clock,
            elapsed: 0.0,
            duration,
            color_snapshot: self.buffer.colors().to_vec(),
            transform_start: self.transform,
            phase: ChoreoPhase::Explosion,
            phase_elapsed: 0.0,
            explosion_origin,
            dispersion,
            shake_dirs,
            recompose_from: self.transform,
        });
        true
    }

    /// Apply a new device profile (viewport resize, orientation change). If
    /// the optimal count changed, the buffer is resynced with a snap.
    pub fn set_device(&mut self, device: DeviceProfile) -> bool {
        self.density = device.density_factor(&self.config.density);
        let shape = self.target_shape();
        if !self.policy.should_resize(self.buffer.len(), shape, self.density) {
            return false;
        }
        self.morph_to_with(shape, Transition::Snap)
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.clock += dt;

        match self.transaction.take() {
            None => self.tick_idle(),
            Some(mut tx) => {
                if self.advance(&mut tx, dt) {
                    self.complete(tx);
                } else {
                    self.transaction = Some(tx);
                }
            }
        }
    }

    fn tick_idle(&mut self) {
        if self.current_shape.is_animated() {
            let time = self.animation_time();
            generate_positions(
                &self.config.shapes,
                self.current_shape,
                self.buffer.positions_mut(),
                time,
            );
        }
    }

    /// Returns `true` once the transaction has finished.
    fn advance(&mut self, tx: &mut MorphTransaction, dt: f32) -> bool {
        tx.elapsed += dt;
        if tx.to.is_animated() {
            generate_positions(
                &self.config.shapes,
                tx.to,
                self.buffer.target_positions_mut(),
                tx.elapsed,
            );
        }

        match tx.transition {
            Transition::Choreographed => self.advance_choreography(tx, dt),
            _ => self.advance_blend(tx),
        }
    }

    fn advance_blend(&mut self, tx: &MorphTransaction) -> bool {
        let progress = (tx.elapsed / tx.duration).min(1.0);
        let eased = ease_out_cubic(progress);

        let view = self.buffer.view_mut();
        for (p, target) in view.positions.iter_mut().zip(view.target_positions.iter()) {
            *p += (*target - *p) * eased;
        }
        lerp_colors(view.colors, &tx.color_snapshot, view.target_colors, eased);
        self.transform = tx.transform_start.lerp(&CloudTransform::IDENTITY, eased);

        progress >= 1.0
    }

    fn advance_choreography(&mut self, tx: &mut MorphTransaction, dt: f32) -> bool {
        tx.phase_elapsed += dt;
        loop {
            let length = self.phase_length(tx.phase);
            if tx.phase_elapsed < length {
                break;
            }
            self.apply_phase(tx, 1.0);
            tx.phase_elapsed -= length;
            match tx.phase.next() {
                Some(next) => {
                    log::debug!("morph -> {}: {:?} -> {:?}", tx.to, tx.phase, next);
                    tx.phase = next;
                    self.enter_phase(tx);
                }
                None => return true,
            }
        }
        let length = self.phase_length(tx.phase);
        let t = if length > 0.0 { tx.phase_elapsed / length } else { 1.0 };
        self.apply_phase(tx, t);
        false
    }

    fn phase_length(&self, phase: ChoreoPhase) -> f32 {
        let morph = &self.config.morph;
        match phase {
            ChoreoPhase::Explosion => morph.explosion_duration,
            ChoreoPhase::Shake => morph.shake_count as f32 * morph.shake_duration,
            ChoreoPhase::Pause => morph.pause_duration,
            ChoreoPhase::Recomposition => morph.recompose_duration,
        }
    }

    fn enter_phase(&mut self, tx: &mut MorphTransaction) {
        if tx.phase == ChoreoPhase::Recomposition {
            let view = self.buffer.view_mut();
            view.positions.copy_from_slice(&*view.target_positions);
            // Explosion turns are whole, so dropping them is invisible.
            let rotation = self.transform.rotation.rem_euclid(TAU);
            self.transform.rotation = rotation;
            self.transform.offset = Vec3::ZERO;
            tx.recompose_from = self.transform;
        }
    }

    /// Set the buffer and transform for local progress `t` in the current
    /// phase.
    fn apply_phase(&mut self, tx: &MorphTransaction, t: f32) {
        let morph = &self.config.morph;
        match tx.phase {
            ChoreoPhase::Explosion => {
                let e = ease_out_cubic(t);
                let start = tx.transform_start;
                self.transform = CloudTransform {
                    scale: lerp(start.scale, morph.explosion_scale, e),
                    rotation: start.rotation + e * morph.explosion_turns as f32 * TAU,
                    offset: start.offset.lerp(Vec3::ZERO, e),
                };
                let positions = self.buffer.positions_mut();
                for ((p, origin), offset) in positions
                    .iter_mut()
                    .zip(&tx.explosion_origin)
                    .zip(&tx.dispersion)
                {
                    *p = *origin + *offset * e;
                }
            }
            ChoreoPhase::Shake => {
                let shakes = tx.shake_dirs.len();
                self.transform.offset = if shakes == 0 || t >= 1.0 {
                    Vec3::ZERO
                } else {
                    let scaled = t * shakes as f32;
                    let k = (scaled.floor() as usize).min(shakes - 1);
                    tx.shake_dirs[k] * morph.shake_amplitude * yoyo(scaled - k as f32)
                };
            }
            ChoreoPhase::Pause => {
                self.transform.offset = Vec3::ZERO;
            }
            ChoreoPhase::Recomposition => {
                let from = tx.recompose_from;
                let home = if from.rotation > PI { TAU } else { 0.0 };
                self.transform = CloudTransform {
                    scale: recompose_scale(from.scale, ease_out_elastic(t)),
                    rotation: lerp(from.rotation, home, ease_out_cubic(t)),
                    offset: Vec3::ZERO,
                };
                let view = self.buffer.view_mut();
                view.positions.copy_from_slice(&*view.target_positions);
                lerp_colors(view.colors, &tx.color_snapshot, view.target_colors, t);
            }
        }
    }

    fn complete(&mut self, tx: MorphTransaction) {
        {
            let view = self.buffer.view_mut();
            view.positions.copy_from_slice(&*view.target_positions);
            view.colors.copy_from_slice(&*view.target_colors);
        }
        self.transform = CloudTransform::IDENTITY;
        self.current_shape = tx.to;
        // Continue the animated target from where the morph last sampled it.
        self.anim_origin = self.clock - tx.elapsed;
        log::info!(
            "morph {} -> {} complete after {:.2}s (started at {:.2}s)",
            tx.from,
            tx.to,
            tx.elapsed,
            tx.started_at
        );
        self.events.push(EngineEvent::MorphCompleted(tx.to));
    }

    fn snap_to(&mut self, shape: Shape) {
        // Resyncing the current shape keeps its animation phase.
        if shape != self.current_shape {
            self.anim_origin = self.clock;
        }
        let time = self.animation_time();
        {
            let view = self.buffer.view_mut();
            generate_positions(&self.config.shapes, shape, view.positions, time);
            generate_colors(shape, view.colors, &mut self.rng);
            generate_sizes(self.config.shapes.point_size(shape), view.sizes, &mut self.rng);
            view.target_positions.copy_from_slice(&*view.positions);
            view.target_colors.copy_from_slice(&*view.colors);
        }
        self.transform = CloudTransform::IDENTITY;
        self.current_shape = shape;
        log::debug!("snapped to {shape} with {} particles", self.buffer.len());
        self.events.push(EngineEvent::MorphCompleted(shape));
    }

    fn resize_for(&mut self, shape: Shape) {
        let count = self.policy.optimal_count(shape, self.density);
        let old = self.buffer.len();
        if self.buffer.resize(count) {
            log::info!("particle buffer resized {old} -> {count} for {shape}");
            self.events.push(EngineEvent::BuffersResized { count });
        }
    }
}

/// Scale during recomposition. Shrinks from `from` to 1, then overshoots
/// around 1 without ever reaching zero.
fn recompose_scale(from: f32, eased: f32) -> f32 {
    if eased <= 1.0 {
        lerp(from, 1.0, eased)
    } else {
        1.0 - (eased - 1.0) * RECOMPOSE_OVERSHOOT
    }
}

fn lerp_colors(out: &mut [Vec3], from: &[Vec3], to: &[Vec3], t: f32) {
    for ((c, a), b) in out.iter_mut().zip(from).zip(to) {
        *c = finite_or_zero(a.lerp(*b, t)).clamp(Vec3::ZERO, Vec3::ONE);
    }
}

fn random_in_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}

fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let v = random_in_unit_ball(rng);
    if v.length_squared() > 1e-8 {
        v.normalize()
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(shape: Shape) -> MorphEngine {
        MorphEngine::with_seed(EngineConfig::default(), shape, DeviceProfile::default(), 7)
    }

    #[test]
    fn test_recompose_scale_stays_near_one() {
        for i in 0..=200 {
            let t = i as f32 / 200.0;
            let scale = recompose_scale(4.0, ease_out_elastic(t));
            assert!(scale > 0.8 && scale <= 4.0, "t={t}: {scale}");
        }
        assert_eq!(recompose_scale(4.0, 0.0), 4.0);
        assert_eq!(recompose_scale(4.0, 1.0), 1.0);
    }

    #[test]
    fn test_phases_run_in_order() {
        let mut engine = engine(Shape::Sphere);
        assert!(engine.morph_to(Shape::Cube));
        let mut seen = vec![];
        for _ in 0..400 {
            if let Some(phase) = engine.phase() {
                if seen.last() != Some(&phase) {
                    seen.push(phase);
                }
            }
            engine.tick(1.0 / 60.0);
        }
        assert_eq!(
            seen,
            vec![
                ChoreoPhase::Explosion,
                ChoreoPhase::Shake,
                ChoreoPhase::Pause,
                ChoreoPhase::Recomposition
            ]
        );
        assert!(!engine.is_morphing());
    }

    #[test]
    fn test_huge_dt_is_clipped() {
        let mut engine = engine(Shape::Sphere);
        engine.morph_to(Shape::Torus);
        engine.tick(1000.0);
        assert!(engine.is_morphing());
        assert!((engine.animation_clock() - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_nan_dt_is_ignored() {
        let mut engine = engine(Shape::Helix);
        let before = engine.positions().to_vec();
        engine.tick(f32::NAN);
        assert_eq!(engine.animation_clock(), 0.0);
        assert_eq!(engine.positions(), &before[..]);
    }

    #[test]
    fn test_explosion_scales_cloud_up() {
        let mut engine = engine(Shape::Sphere);
        engine.morph_to(Shape::Torus);
        for _ in 0..30 {
            engine.tick(1.0 / 60.0);
        }
        assert_eq!(engine.phase(), Some(ChoreoPhase::Explosion));
        assert!(engine.cloud_transform().scale > 1.5);
    }

    #[test]
    fn test_unit_ball_samples_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!(random_in_unit_ball(&mut rng).length() <= 1.0 + 1e-6);
            assert!((random_unit(&mut rng).length() - 1.0).abs() < 1e-4);
        }
    }
}
