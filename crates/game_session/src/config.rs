//! Session and storage configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! [session]
//! engine_color = "black"
//! engine_delay_ms = 600
//! default_mode = "vs-engine"
//! default_difficulty = "medium"
//!
//! [storage]
//! dir = "chess-data"
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chess_core::Color;
use classical_engine::Difficulty;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, record::GameMode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Color the built-in opponent plays in vs-engine mode.
    pub engine_color: Color,
    /// Pause before the engine starts searching, in milliseconds.
    pub engine_delay_ms: u64,
    pub default_mode: GameMode,
    pub default_difficulty: Difficulty,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_color: Color::Black,
            engine_delay_ms: 600,
            default_mode: GameMode::VsEngine,
            default_difficulty: Difficulty::Medium,
        }
    }
}

impl SessionConfig {
    pub fn engine_delay(&self) -> Duration {
        Duration::from_millis(self.engine_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `saved_game.json` and `library.json`.
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("chess-data"),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
