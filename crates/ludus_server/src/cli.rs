//! Command-line interface for the ludus server.

use clap::{Parser, Subcommand};

/// Ludus - ludus latrunculorum game server
#[derive(Parser, Debug)]
#[command(name = "ludus")]
#[command(about = "Two-player ludus latrunculorum server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to, overriding the config file
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to, overriding the config file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Replay a game and print the board
    Replay {
        /// Compressed game config, e.g. "8,12,6,5"
        #[arg(short, long, default_value = "8,12,6,5")]
        config: String,

        /// Compressed move sequence, e.g. "0,0,1,0/7,0,6,0"
        #[arg(short, long, default_value = "")]
        moves: String,
    },
}
