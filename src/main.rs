//! Pagic - render a markdown tree through per-directory layouts.

mod build;
mod cli;
mod config;
mod layout;
mod logger;
mod pipeline;
mod utils;
mod watch;
mod writer;

use anyhow::{Context, Result};
use build::BuildCoordinator;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use watch::WatchSession;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let coordinator = BuildCoordinator::new(&config);
    coordinator.full_build()?;

    if !config.watch.enable {
        return Ok(());
    }

    let session = WatchSession::start(coordinator, config.watch.verbose)?;
    let handle = session.stop_handle();
    ctrlc::set_handler(move || handle.stop()).context("Failed to set Ctrl-C handler")?;

    session.run()
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let config = SiteConfig::load(cli)?;
    config.validate()?;
    Ok(config)
}
