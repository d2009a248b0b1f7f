//! Command-line interface for chess_rooms.

use clap::{Parser, Subcommand};

/// Chess Rooms - two-player chess over a shared game record
#[derive(Parser, Debug)]
#[command(name = "chess_rooms")]
#[command(about = "Two-player chess over a shared real-time game record", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the terminal client (create or join rooms; hot-seat capable)
    Play {
        /// Display name used at sign-in; falls back to the config file
        #[arg(short, long)]
        name: Option<String>,

        /// Path to the TOML configuration file
        #[arg(long, default_value = "chess_rooms.toml")]
        config: std::path::PathBuf,
    },
}
