//! Scroll-driven morph triggers with hysteresis.
//!
//! Each page section past the first flips to active once its top edge rises
//! above the `forward` line and back to inactive only once it falls below
//! the lower `backward` line. Hovering between the two lines changes
//! nothing, so the shape cannot thrash at a boundary.

use crate::config::TriggerConfig;
use crate::shapes::Shape;

/// Instruction for the engine: morph to `shape`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MorphCommand {
    pub shape: Shape,
}

#[derive(Clone, Debug)]
struct Section {
    shape: Shape,
    active: bool,
    /// Scroll progress through the section, [0,1]
    progress: f32,
}

#[derive(Clone, Debug)]
pub struct ScrollTriggerController {
    config: TriggerConfig,
    sections: Vec<Section>,
    /// Last shape handed to the engine
    issued: Option<Shape>,
}

impl ScrollTriggerController {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            sections: Vec::new(),
            issued: None,
        }
    }

    pub fn with_sections(config: TriggerConfig, shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut controller = Self::new(config);
        for shape in shapes {
            controller.add_section(shape);
        }
        controller
    }

    /// Register the next section in page order and return its index. The
    /// first section is the baseline the engine is assumed to start on,
    /// unless a shape was already acknowledged.
    pub fn add_section(&mut self, shape: Shape) -> usize {
        let first = self.sections.is_empty();
        self.sections.push(Section {
            shape,
            active: first,
            progress: 0.0,
        });
        if first && self.issued.is_none() {
            self.issued = Some(shape);
        }
        self.sections.len() - 1
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Highest active section; the baseline when nothing past it is active.
    pub fn active_section(&self) -> Option<usize> {
        self.sections.iter().rposition(|s| s.active)
    }

    pub fn desired_shape(&self) -> Option<Shape> {
        self.active_section().map(|k| self.sections[k].shape)
    }

    /// Tell the controller which shape the engine is actually showing, e.g.
    /// after the host snapped it directly.
    pub fn acknowledge(&mut self, shape: Shape) {
        self.issued = Some(shape);
    }

    /// Feed the position of `section`'s top edge, as a fraction of the
    /// viewport height from the top (1.0 = bottom edge, 0.0 = top edge).
    /// Returns a command when the desired shape changed.
    pub fn observe(&mut self, section: usize, top_ratio: f32) -> Option<MorphCommand> {
        if !top_ratio.is_finite() {
            log::debug!("ignoring non-finite scroll ratio for section {section}");
            return None;
        }
        // The baseline section never deactivates.
        if section == 0 {
            return None;
        }
        let forward = self.config.forward;
        let backward = self.config.backward;
        let state = self.sections.get_mut(section)?;

        if !state.active && top_ratio <= forward {
            state.active = true;
            log::debug!("section {section} ({}) activated at {top_ratio:.2}", state.shape);
        } else if state.active && top_ratio >= backward {
            state.active = false;
            state.progress = 0.0;
            log::debug!("section {section} ({}) deactivated at {top_ratio:.2}", state.shape);
        }

        let desired = self.desired_shape()?;
        if self.issued == Some(desired) {
            return None;
        }
        self.issued = Some(desired);
        Some(MorphCommand { shape: desired })
    }

    /// Continuous progress through `section`, in [0,1].
    pub fn observe_progress(&mut self, section: usize, progress: f32) {
        if let Some(state) = self.sections.get_mut(section) {
            state.progress = if progress.is_finite() {
                progress.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    }

    /// Uniform "progressive separation" scale for the active section;
    /// identity when no section is active or progress is zero.
    pub fn separation_scale(&self) -> f32 {
        match self.active_section() {
            Some(k) => 1.0 + self.config.separation_strength * self.sections[k].progress,
            None => 1.0,
        }
    }

    /// Forget all hysteresis state, back to the baseline section.
    pub fn reset(&mut self) {
        for (i, s) in self.sections.iter_mut().enumerate() {
            s.active = i == 0;
            s.progress = 0.0;
        }
        self.issued = self.sections.first().map(|s| s.shape);
    }
}
