//! CLI Adapter
//!
//! Command-line interface for the silver-rates binary.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, FetchCmd, ServeCmd, ShowCmd};

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
