use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use minivillage_input::Key;
use minivillage_kernel::{FixedRateClock, MiniVillage, VillageConfig, build_village};
use minivillage_render::RecordingContext;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minivillage-cli", about = "Headless Mini Village tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct VillageArgs {
    /// Village layout JSON; the built-in village when omitted
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Hide the coordinate axes
    #[arg(long)]
    no_axes: bool,

    /// Windmill blade speed in degrees per second
    #[arg(long)]
    windmill_speed: Option<f32>,
}

impl VillageArgs {
    fn config(&self) -> anyhow::Result<VillageConfig> {
        let mut config = match &self.layout {
            Some(path) => VillageConfig::load(path)
                .with_context(|| format!("loading layout {}", path.display()))?,
            None => VillageConfig::default(),
        };
        if self.no_axes {
            config.draw_axes = false;
        }
        if let Some(speed) = self.windmill_speed {
            config.windmill.speed = speed;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the village layout as JSON with scene counts
    DumpLayout {
        #[command(flatten)]
        village: VillageArgs,
    },
    /// Run frames against the recording backend and report draw statistics
    Simulate {
        #[command(flatten)]
        village: VillageArgs,
        /// Number of frames to render
        #[arg(short, long, default_value = "120")]
        frames: usize,
        /// Simulated display rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Keys held for the whole run, as codes (KeyA, KeyB, ...)
        #[arg(long, value_delimiter = ',')]
        hold: Vec<String>,
        #[arg(long, default_value = "960")]
        width: u32,
        #[arg(long, default_value = "640")]
        height: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("minivillage-cli starting");

    match cli.command {
        Commands::Info => {
            println!("minivillage-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", minivillage_common::crate_info());
            println!("input: {}", minivillage_input::crate_info());
            println!("render: {}", minivillage_render::crate_info());
            println!("shapes: {}", minivillage_shapes::crate_info());
            println!("kernel: {}", minivillage_kernel::crate_info());
        }
        Commands::DumpLayout { village } => {
            let config = village.config()?;
            let scene = build_village(&config)?;
            println!("{}", config.to_json_pretty()?);
            eprintln!(
                "houses={} parts={} roads={} posts={} planks={} doors={} entries={}",
                config.houses.len(),
                scene.houses.len(),
                scene.roads.len(),
                scene.fence_posts.len(),
                scene.fence_planks.len(),
                scene.door_count(),
                scene.entry_count()
            );
        }
        Commands::Simulate {
            village,
            frames,
            fps,
            hold,
            width,
            height,
        } => {
            let config = village.config()?;
            let mut gfx = RecordingContext::new(Default::default(), width, height);
            let shader = gfx.shader();
            let mut mini = MiniVillage::initialize(&mut gfx, shader, config)?;

            for code in &hold {
                let key = Key::from_code(code)
                    .with_context(|| format!("unknown key code {code:?}"))?;
                mini.input_mut().set(key, true);
            }

            println!("Simulating {frames} frames at {fps} fps ({width}x{height})");
            let mut samples = Vec::new();
            for timestamp in FixedRateClock::new(fps).take(frames) {
                // Keep only the last frame's commands for the summary.
                gfx.take_commands();
                let stats = mini.render_frame(&mut gfx, timestamp);
                if let Some(n) = stats.fps {
                    samples.push(n);
                }
            }

            print!("{}", gfx.summary());
            println!("Frames rendered: {}", mini.frames_rendered());
            println!("FPS samples: {samples:?}");
            println!("Camera: {}", mini.camera());
            println!("Windmill angle: {:.1}", mini.scene().windmill.angle());
        }
    }

    Ok(())
}
