use crate::config::{ConfigError, VillageConfig};
use crate::layout::{LayoutError, build_village};
use crate::scene::Scene;
use minivillage_input::InputState;
use minivillage_render::{Camera, GraphicsContext, ShaderInfo};
use minivillage_shapes::ShapeError;

/// Anything that can stop the village from starting.
#[derive(Debug, thiserror::Error)]
pub enum VillageError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ShapeError> for VillageError {
    fn from(err: ShapeError) -> Self {
        VillageError::Layout(LayoutError::Shape(err))
    }
}

/// Seconds between consecutive frame timestamps; zero on the first frame.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_ms: Option<f64>,
}

impl FrameTimer {
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let elapsed = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        elapsed
    }
}

/// Counts frames and yields the count once every second.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u32,
    window_start_ms: f64,
}

impl FpsCounter {
    /// Register a frame at `now_ms`. Returns the number of frames counted in
    /// the window that just closed, if at least 1000 ms have passed.
    pub fn tick(&mut self, now_ms: f64) -> Option<u32> {
        let sample = if now_ms - self.window_start_ms >= 1000.0 {
            let frames = self.frames;
            self.frames = 0;
            self.window_start_ms = now_ms;
            Some(frames)
        } else {
            None
        };
        self.frames += 1;
        sample
    }
}

/// Timestamps for a host without a display refresh callback.
#[derive(Debug, Clone)]
pub struct FixedRateClock {
    next_ms: f64,
    interval_ms: f64,
}

impl FixedRateClock {
    pub fn new(fps: f64) -> Self {
        Self {
            next_ms: 0.0,
            interval_ms: 1000.0 / fps.max(1.0),
        }
    }
}

impl Iterator for FixedRateClock {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let now = self.next_ms;
        self.next_ms += self.interval_ms;
        Some(now)
    }
}

/// What one call to [`MiniVillage::render_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub elapsed: f32,
    /// Frames counted over the last full second, when one just closed.
    pub fps: Option<u32>,
}

/// The frame driver: owns the scene, camera, input latch and timing.
#[derive(Debug)]
pub struct MiniVillage {
    config: VillageConfig,
    shader: ShaderInfo,
    camera: Camera,
    input: InputState,
    scene: Scene,
    timer: FrameTimer,
    fps: FpsCounter,
    frame: u64,
}

impl MiniVillage {
    /// Build the scene from `config`, upload every buffer and place the camera.
    pub fn initialize(
        gfx: &mut dyn GraphicsContext,
        shader: ShaderInfo,
        config: VillageConfig,
    ) -> Result<Self, VillageError> {
        let _span = tracing::info_span!("initialize").entered();
        let mut scene = build_village(&config)?;
        scene.upload(gfx);

        let mut camera = Camera::default();
        let c = config.camera;
        camera.set_position(c.position.x, c.position.y, c.position.z);
        camera.set_look_at(c.look_at.x, c.look_at.y, c.look_at.z);
        camera.set_up(c.up.x, c.up.y, c.up.z);
        camera.set_near(c.near);
        camera.set_far(c.far);
        let (width, height) = gfx.viewport_size();
        camera.set_viewport(width, height);
        camera.refresh();
        tracing::info!(camera = %camera, width, height, "village initialized");

        Ok(Self {
            config,
            shader,
            camera,
            input: InputState::new(),
            scene,
            timer: FrameTimer::default(),
            fps: FpsCounter::default(),
            frame: 0,
        })
    }

    /// Run one frame at host time `timestamp_ms`.
    ///
    /// Order: elapsed time, camera input, clear, camera matrices, then the
    /// scene in its fixed draw order.
    pub fn render_frame(&mut self, gfx: &mut dyn GraphicsContext, timestamp_ms: f64) -> FrameStats {
        let _span = tracing::trace_span!("frame", n = self.frame).entered();
        let elapsed = self.timer.tick(timestamp_ms);

        self.camera.handle_input(&self.input, elapsed);
        gfx.clear(self.config.clear_color.to_array());

        let (width, height) = gfx.viewport_size();
        self.camera.set_viewport(width, height);
        let matrices = self.camera.refresh();

        gfx.use_program(self.shader.program);
        self.scene.draw(gfx, &self.shader, &matrices, elapsed);

        let fps = self.fps.tick(timestamp_ms);
        if let Some(fps) = fps {
            tracing::debug!(fps, camera = %self.camera, "fps sample");
        }
        let stats = FrameStats {
            frame: self.frame,
            elapsed,
            fps,
        };
        self.frame += 1;
        stats
    }

    pub fn set_windmill_speed(&mut self, degrees_per_second: f32) {
        self.scene.windmill.set_speed(degrees_per_second);
    }

    /// Show or hide the coordinate axes; newly shown axes are uploaded here.
    pub fn set_axes_visible(
        &mut self,
        gfx: &mut dyn GraphicsContext,
        visible: bool,
    ) -> Result<(), VillageError> {
        self.config.draw_axes = visible;
        self.scene.set_axes_visible(visible, self.config.axes_bound)?;
        self.scene.upload(gfx);
        Ok(())
    }

    /// Key state the host writes into between frames.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &VillageConfig {
        &self.config
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }
}
