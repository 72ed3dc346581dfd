// SPDX-License-Identifier: GPL-3.0-only

use camera_session::CameraMode;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "camera-session")]
#[command(about = "Drive a camera session against simulated hardware")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session and print its events
    Demo {
        /// Self-timer in seconds before the photo (0, 3 or 10)
        #[arg(short, long, default_value = "0")]
        timer: u32,

        /// Record a timelapse with this many frames after the photo
        #[arg(long, default_value = "0")]
        timelapse_frames: u32,

        /// Mode to take the photo in
        #[arg(short, long, default_value = "photo")]
        mode: CameraMode,
    },

    /// Show the configuration file location and effective values
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_session=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            timer,
            timelapse_frames,
            mode,
        } => cli::run_demo(timer, timelapse_frames, mode),
        Commands::Config => cli::show_config(),
    }
}
