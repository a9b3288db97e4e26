//! binlog-chaos CLI
//!
//! Fault injection for MySQL binlog and replication testing.

#![allow(clippy::print_stdout)]

mod cli;
mod commands;
mod output;
mod signals;

use anyhow::Context;
use application::InterruptSignal;
use clap::Parser;
use infrastructure::{ToolkitConfig, init_logging};

use crate::cli::Cli;
use crate::commands::App;
use crate::output::Output;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ToolkitConfig::load_from(Some(path.as_path()), std::env::vars().collect()),
        None => ToolkitConfig::load(),
    }
    .context("failed to load configuration")?;

    init_logging(&config.logging, cli.verbose)?;

    let (handle, signal) = InterruptSignal::new();
    signals::spawn_listener(handle);

    let app = App::new(config, cli.seed, Output::new(cli.json));
    app.run(cli.command, &signal).await
}
