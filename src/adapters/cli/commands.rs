//! CLI Commands
//!
//! Argument definitions for the silver-rates binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Silver Rates - FENEGOSIDA silver quote scraper and rates API
#[derive(Parser, Debug)]
#[command(
    name = "silver-rates",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Silver rate scraper and /api/rates server",
    long_about = "Polls the FENEGOSIDA rate board for the per-tola and per-10-gram silver \
                  price, keeps the last good quote on disk and serves sale/buy prices to \
                  the rate widget."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the poller and the rates API
    Serve(ServeCmd),

    /// Fetch and extract the board once without touching the store
    Fetch(FetchCmd),

    /// Print the stored snapshot and the rates the API would serve
    Show(ShowCmd),
}

/// Run poller + API
#[derive(Parser, Debug)]
pub struct ServeCmd {
    /// Override listen port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Override snapshot file
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,
}

/// One-shot fetch
#[derive(Parser, Debug)]
pub struct FetchCmd {
    /// Override source URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Print the extracted snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Show stored snapshot
#[derive(Parser, Debug)]
pub struct ShowCmd {
    /// Override snapshot file
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,
}
