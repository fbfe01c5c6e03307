//! CLI module for the Patwos API
//!
//! `serve` (the default) runs the HTTP server.

pub mod serve;

use clap::{Parser, Subcommand};

/// Patwos API - account service with token authentication and rate limiting
#[derive(Parser)]
#[command(name = "patwos-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file layered above config/default and config/local
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the API server (default)
    Serve,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
