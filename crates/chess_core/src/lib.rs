pub mod board;
pub mod error;
pub mod game;
pub mod movegen;
pub mod notation;
pub mod pgn;
pub mod types;
pub mod zobrist;

// Re-export the rules engine (not engine-specific)
pub use board::*;
pub use error::*;
pub use game::*;
pub use movegen::*;
pub use notation::*;
pub use pgn::*;
pub use types::*;
pub use zobrist::ZOBRIST;

// =============================================================================
// Engine trait: implemented by move-choosing engines
// =============================================================================

/// Result of a search operation
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move found (None if no legal moves)
    pub best_move: Option<Move>,
    /// Evaluation in centipawns, positive favouring White
    pub score: i32,
    /// Plies searched below the root
    pub depth: u8,
    /// Number of nodes searched
    pub nodes: u64,
}

/// Trait that chess engines implement so the session layer can swap them.
///
/// Searches take `&self` so one engine can be shared across the blocking
/// tasks that run engine turns.
pub trait Engine: Send + Sync {
    /// Search `pos` to `depth` plies and report the chosen move.
    fn search(&self, pos: &Position, depth: u8) -> SearchResult;

    /// Short display name.
    fn name(&self) -> &str;
}
