//! Classical Chess Engine
//!
//! Minimax with alpha-beta pruning over a material and piece-square-table
//! evaluation, plus the move-quality classifier used for game review.

pub mod eval;
pub mod quality;
pub mod search;

use std::{
    fmt,
    str::FromStr,
    sync::{Mutex, PoisonError},
};

use chess_core::{move_to_uci, Engine, Move, Position, SearchResult};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Playing strength of the built-in opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Half-moves searched below the root move.
    pub fn plies_beyond_root(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    /// Total search depth including the root move.
    pub fn search_depth(self) -> u8 {
        self.plies_beyond_root() + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty '{s}'"))
    }
}

/// Minimax engine with a seedable source for root-move shuffling.
///
/// The random source only diversifies the choice among equally scored moves;
/// it never changes a score.
#[derive(Debug)]
pub struct MinimaxEngine {
    rng: Mutex<StdRng>,
}

impl Default for MinimaxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MinimaxEngine {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible engine for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Best move for the side to move at `difficulty`, or `None` when there
    /// is no legal move.
    pub fn best_move(&self, pos: &Position, difficulty: Difficulty) -> Option<Move> {
        self.search(pos, difficulty.search_depth()).best_move
    }
}

impl Engine for MinimaxEngine {
    fn search(&self, pos: &Position, depth: u8) -> SearchResult {
        let mut nodes = 0;
        let result = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            search::pick_best_move(pos, depth, &mut *rng, &mut nodes)
        };

        if let Some((mv, score)) = result {
            debug!(mv = %move_to_uci(mv), score, depth, nodes, "search finished");
        } else {
            debug!(depth, "search found no legal move");
        }

        SearchResult {
            best_move: result.map(|(mv, _)| mv),
            score: result.map_or(0, |(_, s)| s),
            depth,
            nodes,
        }
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}

pub use eval::{evaluate, piece_value, square_bonus};
pub use quality::{classify, classify_delta, mover_delta, QualityLabel};
pub use search::{pick_best_move, MATE_SCORE, SEARCH_BOUND};
