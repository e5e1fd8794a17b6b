//! CLI module for the auth token service

pub mod serve;

use clap::{Parser, Subcommand};

/// Auth token service - credential checks, access tokens, and refresh rotation
#[derive(Parser)]
#[command(name = "auth-token-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,
}
