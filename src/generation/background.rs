//! # Background Generation
//!
//! Runs world generation on the tokio blocking pool so an async front end
//! stays responsive while caves and the overworld are built.

use crate::{DeepwildError, DeepwildResult, GameState, GenerationConfig};
use log::debug;
use tokio::task::JoinHandle;

/// Starts generating a new game on the blocking pool.
pub fn spawn_new_game(config: GenerationConfig) -> JoinHandle<DeepwildResult<GameState>> {
    debug!("Spawning background generation for seed {}", config.seed);
    tokio::task::spawn_blocking(move || GameState::new_game(&config))
}

/// Generates a new game without blocking the calling task.
pub async fn generate_new_game(config: GenerationConfig) -> DeepwildResult<GameState> {
    spawn_new_game(config).await.map_err(|e| {
        DeepwildError::InvalidState(format!("Background generation did not finish: {}", e))
    })?
}
