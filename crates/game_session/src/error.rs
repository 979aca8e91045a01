//! Error types for sessions, storage and configuration.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// A persistence operation failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration could not be read or parsed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("illegal move {from}-{to}")]
    InvalidMove { from: String, to: String },

    #[error("no game in progress")]
    NoActiveGame,

    #[error("game is already over")]
    GameOver,

    #[error("it is the engine's turn")]
    EngineTurn,

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("match {id} is corrupted at ply {ply}: '{san}'")]
    CorruptedRecord { id: Uuid, ply: usize, san: String },

    #[error("saved game could not be restored: {0}")]
    CorruptedSnapshot(#[from] chess_core::PgnError),
}
