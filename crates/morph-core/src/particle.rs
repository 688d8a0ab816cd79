use glam::Vec3;

/// SoA particle storage owned by the engine.
///
/// All five arrays always share one length; they are only ever resized
/// together through [`ParticleBuffer::resize`].
#[derive(Clone, Debug, Default)]
pub struct ParticleBuffer {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    sizes: Vec<f32>,
    /// Interpolation destination during a morph
    target_positions: Vec<Vec3>,
    target_colors: Vec<Vec3>,
}

/// Mutable borrows of every array at once, for code that reads one array
/// while writing another.
pub struct BufferViewMut<'a> {
    pub positions: &'a mut [Vec3],
    pub colors: &'a mut [Vec3],
    pub sizes: &'a mut [f32],
    pub target_positions: &'a mut [Vec3],
    pub target_colors: &'a mut [Vec3],
}

impl ParticleBuffer {
    pub fn new(count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; count],
            colors: vec![Vec3::ONE; count],
            sizes: vec![0.0; count],
            target_positions: vec![Vec3::ZERO; count],
            target_colors: vec![Vec3::ONE; count],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Resize every array to `new_count`.
    ///
    /// Growing keeps `0..old` untouched and seeds each new slot from
    /// `i % old`, so new particles start on top of existing ones instead of
    /// popping in at the origin. Shrinking drops the tail. Returns whether
    /// the length changed.
    pub fn resize(&mut self, new_count: usize) -> bool {
        let old = self.len();
        if new_count == old {
            return false;
        }
        if new_count < old {
            self.positions.truncate(new_count);
            self.colors.truncate(new_count);
            self.sizes.truncate(new_count);
            self.target_positions.truncate(new_count);
            self.target_colors.truncate(new_count);
        } else if old == 0 {
            *self = Self::new(new_count);
        } else {
            grow_cycled(&mut self.positions, new_count);
            grow_cycled(&mut self.colors, new_count);
            grow_cycled(&mut self.sizes, new_count);
            grow_cycled(&mut self.target_positions, new_count);
            grow_cycled(&mut self.target_colors, new_count);
        }
        debug_assert!(self.is_consistent());
        true
    }

    pub fn is_consistent(&self) -> bool {
        let n = self.positions.len();
        self.colors.len() == n
            && self.sizes.len() == n
            && self.target_positions.len() == n
            && self.target_colors.len() == n
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn target_positions(&self) -> &[Vec3] {
        &self.target_positions
    }

    pub fn target_colors(&self) -> &[Vec3] {
        &self.target_colors
    }

    /// Positions as `[x, y, z, x, y, z, ...]`, length `3 * len()`.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colours as `[r, g, b, ...]`, length `3 * len()`.
    pub fn colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn view_mut(&mut self) -> BufferViewMut<'_> {
        BufferViewMut {
            positions: &mut self.positions,
            colors: &mut self.colors,
            sizes: &mut self.sizes,
            target_positions: &mut self.target_positions,
            target_colors: &mut self.target_colors,
        }
    }

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    pub fn target_positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.target_positions
    }
}

fn grow_cycled<T: Copy>(v: &mut Vec<T>, new_count: usize) {
    let old = v.len();
    v.reserve(new_count - old);
    for i in old..new_count {
        let src = v[i % old];
        v.push(src);
    }
}
