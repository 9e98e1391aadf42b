// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use lenscap::app::App;
use lenscap::backends::camera::{self, Facing, FrameSource, TestPatternSource};
use lenscap::config::Config;
use lenscap::pipelines::video::default_sink_factory;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

#[derive(Parser)]
#[command(name = "lenscap")]
#[command(about = "Live camera capture with real-time filters")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Seed settings from a JSON file (never written back)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the synthetic colour-bar source instead of a real camera
    #[arg(long, global = true)]
    test_pattern: bool,

    /// Camera to start with
    #[arg(long, global = true, value_parser = parse_facing)]
    facing: Option<Facing>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (renders camera to terminal, the default)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Output directory (default: ~/Pictures/Lenscap)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video
    Video {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Output directory (default: ~/Videos/Lenscap)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_facing(value: &str) -> Result<Facing, String> {
    Facing::from_location(value).ok_or_else(|| format!("unknown facing '{}'", value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=lenscap=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(facing) = cli.facing {
        config.facing = facing;
    }

    let source: Arc<dyn FrameSource> = if cli.test_pattern {
        Arc::new(TestPatternSource::new())
    } else {
        camera::default_source()
    };

    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Some(Commands::List) => cli::list_cameras(source.as_ref()),
        Some(Commands::Photo { output }) => {
            if output.is_some() {
                config.save_dir = output;
            }
            let app = App::new(config, source, default_sink_factory());
            runtime.block_on(cli::take_photo(app))
        }
        Some(Commands::Video { duration, output }) => {
            if output.is_some() {
                config.save_dir = output;
            }
            let app = App::new(config, source, default_sink_factory());
            runtime.block_on(cli::record_video(app, duration))
        }
        Some(Commands::Terminal) | None => {
            let app = App::new(config, source, default_sink_factory());
            runtime.block_on(lenscap::terminal::run(app))
        }
    }
}
