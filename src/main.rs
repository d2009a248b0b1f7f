//! Chess Rooms - terminal client entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use chess_rooms::{
    AppConfig, Cli, Command, IdentityGate, InMemoryGameStore, LocalIdentityGate, RoomSynchronizer,
    run_tui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { name, config } => run_play(name, config).await,
    }
}

/// Signs the player in and launches the terminal client.
async fn run_play(name: Option<String>, config_path: PathBuf) -> Result<()> {
    let config = AppConfig::load_or_default(&config_path);

    let display_name = name
        .or_else(|| config.player_name().clone())
        .unwrap_or_else(|| "Player".to_string());

    let gate = LocalIdentityGate::new();
    let mut user = gate.sign_in(&display_name).await?;

    // Both seats of a hot-seat game share this store. A deployment against
    // a hosted document store swaps the adapter here.
    let store = Arc::new(InMemoryGameStore::new());
    let synchronizer = RoomSynchronizer::new(store);

    // Sign out even when the client tears down with an error.
    let result = run_tui(synchronizer, user.clone(), config, config_path).await;
    gate.sign_out(&mut user);
    result
}
