use morph_core::config::{EngineConfig, TriggerConfig};
use morph_core::count::DeviceProfile;
use morph_core::morph::MorphEngine;
use morph_core::shapes::Shape;
use morph_core::trigger::{MorphCommand, ScrollTriggerController};

fn page() -> ScrollTriggerController {
    ScrollTriggerController::with_sections(
        TriggerConfig::default(),
        [Shape::Sphere, Shape::Torus, Shape::Cube, Shape::Blob, Shape::Helix],
    )
}

/// Sweep section `k`'s top edge from `from` to `to` in small steps,
/// collecting every command issued.
fn sweep(
    controller: &mut ScrollTriggerController,
    k: usize,
    from: f32,
    to: f32,
) -> Vec<MorphCommand> {
    let steps = 200;
    (0..=steps)
        .filter_map(|i| {
            let ratio = from + (to - from) * i as f32 / steps as f32;
            controller.observe(k, ratio)
        })
        .collect()
}

#[test]
fn test_forward_then_backward_issue_one_command_each() {
    let mut controller = page();

    let down = sweep(&mut controller, 1, 1.0, 0.0);
    assert_eq!(down, vec![MorphCommand { shape: Shape::Torus }]);

    let up = sweep(&mut controller, 1, 0.0, 1.0);
    assert_eq!(up, vec![MorphCommand { shape: Shape::Sphere }]);
}

#[test]
fn test_thresholds_fire_at_the_right_lines() {
    let mut controller = page();
    assert_eq!(controller.observe(1, 0.21), None);
    assert_eq!(
        controller.observe(1, 0.2),
        Some(MorphCommand { shape: Shape::Torus })
    );
    assert_eq!(controller.observe(1, 0.59), None);
    assert_eq!(
        controller.observe(1, 0.6),
        Some(MorphCommand { shape: Shape::Sphere })
    );
}

#[test]
fn test_oscillation_in_dead_zone_is_silent() {
    let mut controller = page();
    sweep(&mut controller, 1, 1.0, 0.1);
    assert_eq!(controller.desired_shape(), Some(Shape::Torus));

    for i in 0..500 {
        let ratio = 0.4 + 0.15 * (i as f32 * 0.7).sin();
        assert_eq!(controller.observe(1, ratio), None, "thrashed at {ratio}");
    }
    assert_eq!(controller.desired_shape(), Some(Shape::Torus));
}

#[test]
fn test_oscillation_before_activation_is_silent() {
    let mut controller = page();
    for i in 0..500 {
        let ratio = 0.4 + 0.15 * (i as f32 * 0.7).sin();
        assert_eq!(controller.observe(1, ratio), None);
    }
    assert_eq!(controller.desired_shape(), Some(Shape::Sphere));
}

#[test]
fn test_scrolling_whole_page_visits_every_shape() {
    let mut controller = page();
    let mut issued = vec![];
    for k in 1..controller.section_count() {
        issued.extend(sweep(&mut controller, k, 1.0, 0.0));
    }
    let shapes: Vec<Shape> = issued.iter().map(|c| c.shape).collect();
    assert_eq!(
        shapes,
        vec![Shape::Torus, Shape::Cube, Shape::Blob, Shape::Helix]
    );
}

#[test]
fn test_fast_scroll_back_lands_on_previous_active_section() {
    let mut controller = page();
    for k in 1..4 {
        sweep(&mut controller, k, 1.0, 0.0);
    }
    assert_eq!(controller.desired_shape(), Some(Shape::Blob));
    assert_eq!(
        controller.observe(3, 0.9),
        Some(MorphCommand { shape: Shape::Cube })
    );
    assert_eq!(controller.active_section(), Some(2));
}

#[test]
fn test_consecutive_sections_with_same_shape_do_not_reissue() {
    let mut controller = ScrollTriggerController::with_sections(
        TriggerConfig::default(),
        [Shape::Sphere, Shape::Sphere, Shape::Cube],
    );
    assert!(sweep(&mut controller, 1, 1.0, 0.0).is_empty());
    assert_eq!(
        sweep(&mut controller, 2, 1.0, 0.0),
        vec![MorphCommand { shape: Shape::Cube }]
    );
}

#[test]
fn test_separation_follows_progress_only_when_active() {
    let mut controller = page();
    controller.observe_progress(1, 0.8);
    // Section 1 is not active yet, baseline has no progress.
    assert_eq!(controller.separation_scale(), 1.0);

    controller.observe(1, 0.1);
    controller.observe_progress(1, 0.5);
    let strength = TriggerConfig::default().separation_strength;
    assert!((controller.separation_scale() - (1.0 + 0.5 * strength)).abs() < 1e-6);

    controller.observe(1, 0.9);
    assert_eq!(controller.separation_scale(), 1.0);
}

#[test]
fn test_reset_returns_to_baseline() {
    let mut controller = page();
    sweep(&mut controller, 1, 1.0, 0.0);
    controller.reset();
    assert_eq!(controller.active_section(), Some(0));
    assert_eq!(controller.desired_shape(), Some(Shape::Sphere));
    assert_eq!(
        sweep(&mut controller, 1, 1.0, 0.0),
        vec![MorphCommand { shape: Shape::Torus }]
    );
}

#[test]
fn test_non_finite_ratio_ignored() {
    let mut controller = page();
    assert_eq!(controller.observe(1, f32::NAN), None);
    assert_eq!(controller.desired_shape(), Some(Shape::Sphere));
}

#[test]
fn test_controller_drives_engine() {
    let mut controller = page();
    let mut engine = MorphEngine::with_seed(
        EngineConfig::default(),
        Shape::Sphere,
        DeviceProfile::default(),
        9,
    );

    let mut ratio = 1.0;
    for _ in 0..600 {
        ratio -= 0.005;
        if let Some(cmd) = controller.observe(1, ratio) {
            assert!(engine.morph_to(cmd.shape));
        }
        engine.set_separation(controller.separation_scale());
        engine.tick(1.0 / 60.0);
    }
    assert_eq!(engine.current_shape(), Shape::Torus);
    assert!(!engine.is_morphing());
}

#[test]
fn test_scrolling_back_reaches_baseline_when_engine_started_elsewhere() {
    let mut controller = ScrollTriggerController::new(TriggerConfig::default());
    controller.acknowledge(Shape::Helix);
    controller.add_section(Shape::Sphere);
    controller.add_section(Shape::Torus);
    assert_eq!(controller.desired_shape(), Some(Shape::Sphere));

    assert_eq!(
        sweep(&mut controller, 1, 1.0, 0.0),
        vec![MorphCommand { shape: Shape::Torus }]
    );
    assert_eq!(
        sweep(&mut controller, 1, 0.0, 1.0),
        vec![MorphCommand { shape: Shape::Sphere }]
    );
}
