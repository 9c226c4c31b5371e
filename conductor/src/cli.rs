use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Conductor routes SQL across SQLite-backed storage shards.
#[derive(Parser, Debug)]
#[command(name = "conductor", version)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "conductor.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the router and wait for a shutdown signal.
    Run,

    /// Check the configuration file for errors without starting anything.
    Configcheck,

    /// Execute every `;`-separated statement in a file and print the
    /// results, one per statement.
    Route {
        /// Path to the file containing the queries.
        #[arg(short, long)]
        file: PathBuf,
    },
}
