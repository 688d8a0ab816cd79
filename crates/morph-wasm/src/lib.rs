use std::sync::Once;

use morph_core::config::EngineConfig;
use morph_core::count::DeviceProfile;
use morph_core::morph::{EngineEvent, MorphEngine, Transition};
use morph_core::shapes::Shape;
use morph_core::trigger::ScrollTriggerController;
use wasm_bindgen::prelude::*;

/// GPU-compatible particle struct: 32 bytes, matches the WGSL vertex layout
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuParticle {
    position: [f32; 3], // 12 bytes
    size: f32,          //  4 bytes
    color: [f32; 3],    // 12 bytes
    _pad: f32,          //  4 bytes
}

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg: JsValue = format!("[{}] {}", record.target(), record.args()).into();
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;
static LOGGER_INIT: Once = Once::new();

fn init_logging() {
    LOGGER_INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    });
}

fn parse_shape(name: &str) -> Option<Shape> {
    match name.parse::<Shape>() {
        Ok(shape) => Some(shape),
        Err(err) => {
            log::warn!("{err}");
            None
        }
    }
}

#[wasm_bindgen]
pub struct MorphWorld {
    engine: MorphEngine,
    controller: ScrollTriggerController,
    gpu_buffer: Vec<GpuParticle>,
    resized: bool,
}

#[wasm_bindgen]
impl MorphWorld {
    /// Unknown `initial_shape` names fall back to the sphere. Zero or NaN
    /// device values fall back to the default density.
    #[wasm_bindgen(constructor)]
    pub fn new(
        initial_shape: &str,
        pixel_ratio: f32,
        width: f32,
        height: f32,
        constrained: bool,
    ) -> MorphWorld {
        Self::build(
            EngineConfig::default(),
            initial_shape,
            DeviceProfile::new(pixel_ratio, width, height, constrained),
        )
    }

    /// Like the constructor, with a JSON override of the engine config.
    /// Missing fields keep their defaults; malformed JSON is logged and
    /// ignored.
    #[wasm_bindgen]
    pub fn with_config(
        config_json: &str,
        initial_shape: &str,
        pixel_ratio: f32,
        width: f32,
        height: f32,
        constrained: bool,
    ) -> MorphWorld {
        init_logging();
        let config = serde_json::from_str::<EngineConfig>(config_json).unwrap_or_else(|err| {
            log::warn!("ignoring engine config override: {err}");
            EngineConfig::default()
        });
        Self::build(
            config,
            initial_shape,
            DeviceProfile::new(pixel_ratio, width, height, constrained),
        )
    }

    /// Advance one frame. Returns the engine time spent in milliseconds.
    #[wasm_bindgen]
    pub fn tick(&mut self, dt: f32) -> f32 {
        let start = js_sys::Date::now();
        self.engine.tick(dt);
        self.write_gpu_output();
        let elapsed = js_sys::Date::now() - start;
        elapsed as f32
    }

    /// Register the next page section. Returns its index, or -1 for an
    /// unknown shape name.
    #[wasm_bindgen]
    pub fn add_section(&mut self, shape: &str) -> i32 {
        match parse_shape(shape) {
            Some(shape) => self.controller.add_section(shape) as i32,
            None => -1,
        }
    }

    /// Feed one viewport-intersection sample. Returns whether a morph
    /// started.
    #[wasm_bindgen]
    pub fn observe_section(&mut self, index: usize, top_ratio: f32, progress: f32) -> bool {
        self.controller.observe_progress(index, progress);
        let started = match self.controller.observe(index, top_ratio) {
            Some(cmd) => self.engine.morph_to(cmd.shape),
            None => false,
        };
        self.engine.set_separation(self.controller.separation_scale());
        started
    }

    #[wasm_bindgen]
    pub fn morph_to(&mut self, shape: &str) -> bool {
        match parse_shape(shape) {
            Some(shape) => {
                self.controller.acknowledge(shape);
                self.engine.morph_to(shape)
            }
            None => false,
        }
    }

    /// Jump to `shape` without animation.
    #[wasm_bindgen]
    pub fn snap_to(&mut self, shape: &str) -> bool {
        let Some(shape) = parse_shape(shape) else {
            return false;
        };
        self.controller.acknowledge(shape);
        let applied = self.engine.morph_to_with(shape, Transition::Snap);
        self.write_gpu_output();
        applied
    }

    /// Viewport resize or orientation change. Returns whether the particle
    /// count changed.
    #[wasm_bindgen]
    pub fn resize_viewport(
        &mut self,
        pixel_ratio: f32,
        width: f32,
        height: f32,
        constrained: bool,
    ) -> bool {
        let changed = self
            .engine
            .set_device(DeviceProfile::new(pixel_ratio, width, height, constrained));
        self.write_gpu_output();
        changed
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.engine.particle_count()
    }

    #[wasm_bindgen]
    pub fn positions_ptr(&self) -> *const f32 {
        self.engine.positions().as_ptr()
    }

    #[wasm_bindgen]
    pub fn colors_ptr(&self) -> *const f32 {
        self.engine.colors().as_ptr()
    }

    #[wasm_bindgen]
    pub fn sizes_ptr(&self) -> *const f32 {
        self.engine.sizes().as_ptr()
    }

    #[wasm_bindgen]
    pub fn get_gpu_buffer_ptr(&self) -> *const f32 {
        self.gpu_buffer.as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn get_gpu_buffer_byte_length(&self) -> usize {
        self.gpu_buffer.len() * std::mem::size_of::<GpuParticle>()
    }

    /// True once after every buffer resize. Pointers from before a resize
    /// are stale and must be re-read.
    #[wasm_bindgen]
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    /// Column-major 4x4 model matrix for the cloud.
    #[wasm_bindgen]
    pub fn model_matrix(&self) -> Vec<f32> {
        let model: glam::Mat4 = self.engine.model_matrix();
        model.to_cols_array().to_vec()
    }

    #[wasm_bindgen]
    pub fn current_shape(&self) -> String {
        self.engine.current_shape().to_string()
    }

    #[wasm_bindgen]
    pub fn is_morphing(&self) -> bool {
        self.engine.is_morphing()
    }
}

impl MorphWorld {
    fn build(config: EngineConfig, initial_shape: &str, device: DeviceProfile) -> MorphWorld {
        init_logging();
        let initial = parse_shape(initial_shape).unwrap_or_default();
        let engine = MorphEngine::new(config, initial, device);
        let mut controller = ScrollTriggerController::new(engine.config().trigger.clone());
        controller.acknowledge(initial);

        web_sys::console::log_1(
            &format!(
                "WASM MorphWorld created: {} ({} particles)",
                initial,
                engine.particle_count()
            )
            .into(),
        );

        let mut world = MorphWorld {
            engine,
            controller,
            gpu_buffer: Vec::new(),
            resized: true,
        };
        world.write_gpu_output();
        world
    }

    fn write_gpu_output(&mut self) {
        for event in self.engine.take_events() {
            if let EngineEvent::BuffersResized { .. } = event {
                self.resized = true;
            }
        }

        let buffer = self.engine.buffer();
        let count = buffer.len();
        self.gpu_buffer.resize(count, bytemuck::Zeroable::zeroed());
        for (i, out) in self.gpu_buffer.iter_mut().enumerate() {
            *out = GpuParticle {
                position: buffer.positions()[i].to_array(),
                size: buffer.sizes()[i],
                color: buffer.colors()[i].to_array(),
                _pad: 0.0,
            };
        }
    }
}
