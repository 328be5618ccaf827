use anyhow::Result;
use clap::Parser;
use minivillage_input::Key;
use minivillage_kernel::{MiniVillage, VillageConfig};
use minivillage_render_wgpu::WgpuContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const TITLE: &str = "Mini Village";

#[derive(Parser)]
#[command(name = "minivillage-desktop", about = "Mini Village viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Village layout JSON; the built-in village when omitted
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Hide the coordinate axes
    #[arg(long)]
    no_axes: bool,

    /// Windmill blade speed in degrees per second
    #[arg(long)]
    windmill_speed: Option<f32>,

    #[arg(long, default_value = "960")]
    width: u32,

    #[arg(long, default_value = "640")]
    height: u32,
}

fn key_for(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyA => Some(Key::RotateLeft),
        KeyCode::KeyD => Some(Key::RotateRight),
        KeyCode::KeyW => Some(Key::RotateUp),
        KeyCode::KeyS => Some(Key::RotateDown),
        KeyCode::KeyV => Some(Key::ZoomOut),
        KeyCode::KeyB => Some(Key::ZoomIn),
        _ => None,
    }
}

/// Window, GPU context and village, created together on first resume.
struct Running {
    window: Arc<Window>,
    ctx: WgpuContext,
    village: MiniVillage,
}

struct App {
    config: Option<VillageConfig>,
    windmill_speed: Option<f32>,
    size: PhysicalSize<u32>,
    started: Instant,
    running: Option<Running>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(cli: &Cli, config: VillageConfig) -> Self {
        Self {
            config: Some(config),
            windmill_speed: cli.windmill_speed,
            size: PhysicalSize::new(cli.width, cli.height),
            started: Instant::now(),
            running: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(config) = self.config.take() else {
            return Ok(());
        };
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(self.size);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let mut ctx = WgpuContext::new(window.clone(), size.width, size.height)?;
        let shader = ctx.shader_info();
        let mut village = MiniVillage::initialize(&mut ctx, shader, config)?;
        if let Some(speed) = self.windmill_speed {
            village.set_windmill_speed(speed);
        }
        window.request_redraw();

        self.running = Some(Running {
            window,
            ctx,
            village,
        });
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                running.ctx.resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(key) = key_for(code) {
                    running
                        .village
                        .input_mut()
                        .set(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::Focused(false) => {
                running.village.input_mut().clear();
            }
            WindowEvent::RedrawRequested => {
                let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
                let stats = running.village.render_frame(&mut running.ctx, now_ms);
                if let Err(e) = running.ctx.present() {
                    tracing::error!("present failed: {e}");
                }
                if let Some(fps) = stats.fps {
                    running.window.set_title(&format!(
                        "{TITLE} | {fps} fps | camera {}",
                        running.village.camera()
                    ));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("minivillage-desktop starting");

    let mut config = match &cli.layout {
        Some(path) => VillageConfig::load(path)?,
        None => VillageConfig::default(),
    };
    if cli.no_axes {
        config.draw_axes = false;
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&cli, config);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
