//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Headless cave flight: populates the world, flies a camera around the
/// central cavern and logs what the renderer would be fed.
#[derive(Parser, Debug)]
#[command(name = "grotto")]
#[command(about = "Procedural underwater cave simulation", long_about = None)]
pub struct Args {
    /// TOML file with [map], [seeds], [terrain], runtime and [driver] sections
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, value_name = "N", default_value_t = 600)]
    pub frames: u32,

    /// Seed for entity placement and crab behaviour
    #[arg(long, value_name = "SEED", default_value_t = 1)]
    pub seed: u64,

    /// Also write debug-level logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Debug-level terminal output
    #[arg(short, long)]
    pub verbose: bool,
}
