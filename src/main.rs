//! Stamp - static asset pipeline with content-hash revisioning.

mod cli;
mod config;
mod core;
mod logger;
mod pipeline;
mod revision;
mod stage;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PipelineConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { build_args } => cli::build::build(&config, build_args),
        Commands::Watch { .. } => cli::watch::watch(&cli, config),
    }
}
