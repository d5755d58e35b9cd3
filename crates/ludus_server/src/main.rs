//! Ludus - server binary.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use ludus_rules::{GameConfig, GameState, MoveSequence};
use ludus_server::{ApiState, GameService, ServerConfig, open_store, router};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config, host, port).await,
        Command::Replay { config, moves } => run_replay(&config, &moves),
    }
}

/// Run the HTTP game server
#[instrument(skip_all)]
async fn run_server(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    }
    .with_address(host, port);

    let store = open_store(config.storage())?;
    let service = GameService::from_config(store, &config)?;
    let app = router(ApiState::new(service, config.wait_timeout()));

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port()))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;
    info!(host = %config.host(), port = config.port(), "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Print a replayed game
fn run_replay(config: &str, moves: &str) -> Result<()> {
    let config = GameConfig::from_compressed(config).context("Invalid game config")?;
    let moves = MoveSequence::from_compressed(moves).context("Invalid move sequence")?;
    let state = GameState::replay(&config, &moves).context("Replay failed")?;
    println!("{state}");
    Ok(())
}
