// Game-level errors

use crate::engine::physics::PhysicsError;
use std::path::PathBuf;

/// Errors surfaced to whoever drives a game session
///
/// Stale references and repeated removals are deliberately absent: those
/// are no-ops inside the loop, never errors.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Physics world failed to initialize: {0}")]
    PhysicsInit(#[from] PhysicsError),

    #[error("Failed to read level file {path}: {source}")]
    LevelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse level data: {0}")]
    LevelParse(#[source] serde_json::Error),

    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Level index {index} out of range ({count} levels loaded)")]
    LevelIndex { index: usize, count: usize },

    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
