use glam::Vec3;
use morph_core::particle::ParticleBuffer;

fn numbered(count: usize) -> ParticleBuffer {
    let mut buffer = ParticleBuffer::new(count);
    let view = buffer.view_mut();
    for i in 0..count {
        view.positions[i] = Vec3::splat(i as f32);
        view.colors[i] = Vec3::splat(i as f32 / count as f32);
        view.sizes[i] = i as f32;
    }
    buffer
}

fn assert_lengths(buffer: &ParticleBuffer, count: usize) {
    assert_eq!(buffer.len(), count);
    assert_eq!(buffer.positions_flat().len(), 3 * count);
    assert_eq!(buffer.colors_flat().len(), 3 * count);
    assert_eq!(buffer.sizes().len(), count);
    assert_eq!(buffer.target_positions().len(), count);
    assert_eq!(buffer.target_colors().len(), count);
    assert!(buffer.is_consistent());
}

#[test]
fn test_grow_keeps_prefix_and_cycles_tail() {
    let mut buffer = numbered(1800);
    let before = buffer.positions().to_vec();
    assert!(buffer.resize(2025));
    assert_lengths(&buffer, 2025);

    assert_eq!(&buffer.positions()[..1800], &before[..]);
    for i in 1800..2025 {
        assert_eq!(buffer.positions()[i], before[i % 1800], "slot {i} not cycled");
        assert_eq!(buffer.sizes()[i], (i % 1800) as f32);
    }
}

#[test]
fn test_grow_more_than_double_cycles_repeatedly() {
    let mut buffer = numbered(3);
    buffer.resize(10);
    let xs: Vec<f32> = buffer.positions().iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0]);
}

#[test]
fn test_shrink_truncates() {
    let mut buffer = numbered(2400);
    let before = buffer.positions().to_vec();
    assert!(buffer.resize(1800));
    assert_lengths(&buffer, 1800);
    assert_eq!(buffer.positions(), &before[..1800]);
}

#[test]
fn test_resize_to_zero_and_back() {
    let mut buffer = numbered(5);
    buffer.resize(0);
    assert_lengths(&buffer, 0);
    assert!(buffer.is_empty());
    buffer.resize(8);
    assert_lengths(&buffer, 8);
}

#[test]
fn test_flat_view_matches_vectors() {
    let buffer = numbered(4);
    let flat = buffer.positions_flat();
    assert_eq!(&flat[6..9], &[2.0, 2.0, 2.0]);
}
