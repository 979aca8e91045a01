//! Error types for the rules engine.

use thiserror::Error;

/// A FEN string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    MissingFields(usize),
    #[error("board section must have 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: usize },
    #[error("invalid piece character '{0}'")]
    Piece(char),
    #[error("invalid side to move '{0}'")]
    SideToMove(String),
    #[error("invalid castling character '{0}'")]
    Castling(char),
    #[error("invalid en-passant square '{0}'")]
    EnPassant(String),
    #[error("invalid move counter '{0}'")]
    Counter(String),
}

/// A move was rejected by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("'{0}' is not a square")]
    BadSquare(String),
    #[error("no legal move from {from} to {to}")]
    Illegal { from: String, to: String },
    #[error("'{0}' is not a legal move in this position")]
    IllegalSan(String),
}

/// A PGN move list could not be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgnError {
    #[error("move {ply} '{san}' is not legal")]
    IllegalMove { ply: usize, san: String },
}
