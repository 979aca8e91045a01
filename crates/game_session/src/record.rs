//! Archived matches and the resumable session snapshot.

use std::fmt;

use chess_core::{Color, Outcome};
use chrono::{DateTime, Utc};
use classical_engine::Difficulty;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who the human plays against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    #[default]
    VsEngine,
    LocalTwoPlayer,
}

impl GameMode {
    /// Opponent label stored with an archived match.
    pub fn opponent_label(self, difficulty: Difficulty) -> String {
        match self {
            GameMode::VsEngine => format!("Computer ({difficulty})"),
            GameMode::LocalTwoPlayer => "Player 2".to_string(),
        }
    }
}

/// Final result of a match, serialized as its PGN token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
    #[serde(rename = "*")]
    Unterminated,
}

impl MatchResult {
    pub fn from_outcome(outcome: Option<Outcome>) -> Self {
        match outcome {
            Some(Outcome::Checkmate {
                winner: Color::White,
            }) => MatchResult::WhiteWins,
            Some(Outcome::Checkmate {
                winner: Color::Black,
            }) => MatchResult::BlackWins,
            Some(Outcome::Draw(_)) => MatchResult::Draw,
            None => MatchResult::Unterminated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchResult::WhiteWins => "1-0",
            MatchResult::BlackWins => "0-1",
            MatchResult::Draw => "1/2-1/2",
            MatchResult::Unterminated => "*",
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archived match. Created once when a game ends (or is archived by
/// hand) and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub moves: Vec<String>,
    pub result: MatchResult,
    pub opponent: String,
    pub move_count: usize,
}

impl MatchRecord {
    pub fn new(moves: Vec<String>, result: MatchResult, opponent: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            move_count: moves.len(),
            moves,
            result,
            opponent,
        }
    }
}

/// Everything needed to resume the live game after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub pgn: String,
    pub mode: GameMode,
    pub difficulty: Difficulty,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
