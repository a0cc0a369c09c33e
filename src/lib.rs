//! # Deepwild
//!
//! Procedural world generation for a top-down action RPG.
//!
//! ## Architecture Overview
//!
//! The crate is built around two self-contained generators and a thin world
//! layer that consumes them:
//!
//! - **Cave Generation**: cellular-automata cave synthesis with region
//!   extraction and random-walk tunnel carving ([`CaveGenerator`])
//! - **Overworld Generation**: a randomized geometric graph of play areas,
//!   pruned under a connectivity invariant ([`OverworldGraphGenerator`])
//! - **World Layer**: per-node area maps, spawn points, enemy packs and the
//!   travel state machine ([`GameState`])
//!
//! Both generators are pure functions of their parameters and a seeded
//! random source: the same seed always yields the same grid or graph.

pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;

/// Core error type for the Deepwild generators and world layer.
#[derive(thiserror::Error, Debug)]
pub enum DeepwildError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generator parameters can never produce a valid result
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Connectivity could not be reached within the attempt budget
    #[error("Generation exhausted after {attempts} attempts: {reason}")]
    GenerationExhausted { attempts: u32, reason: String },

    /// A generated cave has no floor cells to place a spawn on
    #[error("Generated map has no floor cells")]
    NoFloorFound,

    /// Overworld travel request is not allowed from the current node
    #[error("Invalid travel: {0}")]
    InvalidTravel(String),

    /// World state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Deepwild codebase.
pub type DeepwildResult<T> = Result<T, DeepwildError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default world constants.
pub mod config {
    /// Default area map width in cells
    pub const DEFAULT_MAP_WIDTH: u32 = 60;

    /// Default area map height in cells
    pub const DEFAULT_MAP_HEIGHT: u32 = 30;

    /// Default overworld grid width in cells
    pub const DEFAULT_OVERWORLD_WIDTH: u32 = 20;

    /// Default overworld grid height in cells
    pub const DEFAULT_OVERWORLD_HEIGHT: u32 = 10;

    /// Full overworld regenerations allowed before giving up
    pub const DEFAULT_MAX_GRAPH_ATTEMPTS: u32 = 100;

    /// Cave regenerations allowed for a single area before giving up
    pub const DEFAULT_MAX_MAP_ATTEMPTS: u32 = 10;
}
