use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lumina::app::{self, SnapshotOptions};
use lumina::render::FontSet;
use lumina::{AppError, Config, Mode};

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "Real-time 2D particle simulations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Starting mode (e.g. HEART, galaxy)
    #[arg(short, long, global = true)]
    mode: Option<Mode>,

    /// Number of particles
    #[arg(short, long, global = true)]
    count: Option<u32>,

    /// Base speed multiplier
    #[arg(short, long, global = true)]
    speed: Option<f32>,

    /// Particle radius in pixels
    #[arg(long, global = true)]
    size: Option<f32>,

    /// Glow blur radius
    #[arg(short, long, global = true)]
    glow: Option<u32>,

    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Font file for rune and snowflake glyphs (repeatable, tried in order)
    #[arg(long = "font", value_name = "PATH", global = true)]
    fonts: Vec<PathBuf>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an interactive window (default)
    Run,

    /// Render headlessly and write the final frame as PNG
    Snapshot {
        /// Output image path
        #[arg(short, long, default_value = "lumina.png")]
        output: PathBuf,

        /// Frames to simulate
        #[arg(short, long, default_value_t = 120)]
        frames: u32,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Trigger a supernova at this frame
        #[arg(long)]
        supernova_at: Option<u32>,
    },
}

impl Cli {
    fn config(&self) -> Result<Config, AppError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(count) = self.count {
            config.particle_count = count;
        }
        if let Some(speed) = self.speed {
            config.base_speed = speed;
        }
        if let Some(size) = self.size {
            config.particle_size = size;
        }
        if let Some(glow) = self.glow {
            config.glow_intensity = glow;
        }
        Ok(config.clamped())
    }
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = cli.config()?;
    log::debug!("starting with {config:?}");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let fonts = FontSet::load(&cli.fonts)?;
            log::debug!("{} fonts loaded", fonts.len());
            app::run_windowed(config, cli.seed, &fonts)
        }
        Commands::Snapshot {
            output,
            frames,
            width,
            height,
            supernova_at,
        } => {
            let options = SnapshotOptions {
                width,
                height,
                frames,
                seed: cli.seed.unwrap_or_default(),
                supernova_at,
                fonts: cli.fonts,
            };
            app::snapshot(config, &options, output)
        }
    }
}
