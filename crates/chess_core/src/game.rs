//! A game in progress: a position plus the stack of moves that produced it.
//!
//! `Game` is the rules-engine object the session layer talks to. It validates
//! and applies moves, produces `AppliedMove` descriptors, undoes moves, and
//! answers the check/checkmate/draw questions, including threefold
//! repetition which needs the position history.

use crate::{
    board::{Position, Undo},
    error::{FenError, MoveError, PgnError},
    movegen::{legal_moves, legal_moves_from},
    notation::{move_to_san, parse_san},
    pgn::{parse_movetext, write_movetext},
    types::*,
};

/// Descriptor of one move that was played. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedMove {
    pub mv: Move,
    pub color: Color,
    pub piece: PieceKind,
    pub promoted_to: Option<PieceKind>,
    pub captured: Option<PieceKind>,
    pub san: String,
    pub before: Position,
    pub after: Position,
}

impl AppliedMove {
    pub fn from_square(&self) -> String {
        sq_to_coord(self.mv.from)
    }

    pub fn to_square(&self) -> String {
        sq_to_coord(self.mv.to)
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

/// How a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Draw(DrawReason),
}

impl Outcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } => Some(winner),
            Outcome::Draw(_) => None,
        }
    }

    /// PGN result token.
    pub fn result_token(self) -> &'static str {
        match self {
            Outcome::Checkmate {
                winner: Color::White,
            } => "1-0",
            Outcome::Checkmate {
                winner: Color::Black,
            } => "0-1",
            Outcome::Draw(_) => "1/2-1/2",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    played: Vec<(AppliedMove, Undo)>,
    /// Position hashes from the start position through the current one.
    keys: Vec<u64>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    pub fn from_position(position: Position) -> Self {
        let keys = vec![position.position_hash()];
        Self {
            position,
            played: Vec::new(),
            keys,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Position::from_fen(fen).map(Self::from_position)
    }

    /// Replays PGN movetext from the standard start position.
    pub fn from_pgn(text: &str) -> Result<Self, PgnError> {
        let mut game = Self::new();
        for (ply, san) in parse_movetext(text).into_iter().enumerate() {
            if game.play_san(&san).is_err() {
                return Err(PgnError::IllegalMove { ply: ply + 1, san });
            }
        }
        Ok(game)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.position)
    }

    pub fn legal_moves_from(&self, from: u8) -> Vec<Move> {
        legal_moves_from(&self.position, from)
    }

    /// Plays `mv` if it is legal. Flags on `mv` are ignored; the matching
    /// generated move supplies them. A promotion with no piece becomes a
    /// queen.
    pub fn play(&mut self, mv: Move) -> Result<AppliedMove, MoveError> {
        let wanted_promo = mv.promo.or(Some(PieceKind::Queen));
        let legal = self
            .legal_moves_from(mv.from)
            .into_iter()
            .find(|m| m.to == mv.to && (m.promo.is_none() || m.promo == wanted_promo))
            .ok_or_else(|| MoveError::Illegal {
                from: sq_to_coord(mv.from),
                to: sq_to_coord(mv.to),
            })?;
        Ok(self.commit(legal))
    }

    /// Plays a move given as coordinate squares such as `"e2"`, `"e4"`.
    pub fn play_coords(
        &mut self,
        from: &str,
        to: &str,
        promo: Option<PieceKind>,
    ) -> Result<AppliedMove, MoveError> {
        let from_sq = coord_to_sq(from).ok_or_else(|| MoveError::BadSquare(from.to_string()))?;
        let to_sq = coord_to_sq(to).ok_or_else(|| MoveError::BadSquare(to.to_string()))?;
        let mut mv = Move::new(from_sq, to_sq);
        mv.promo = promo;
        self.play(mv)
    }

    pub fn play_san(&mut self, san: &str) -> Result<AppliedMove, MoveError> {
        let mv = parse_san(&self.position, san)
            .ok_or_else(|| MoveError::IllegalSan(san.to_string()))?;
        Ok(self.commit(mv))
    }

    fn commit(&mut self, mv: Move) -> AppliedMove {
        let before = self.position.clone();
        let san = move_to_san(&before, mv);
        let undo = self.position.make_move(mv);

        let applied = AppliedMove {
            mv,
            color: undo.moved_piece.color,
            piece: undo.moved_piece.kind,
            promoted_to: mv.promo,
            captured: undo.captured.map(|p| p.kind),
            san,
            before,
            after: self.position.clone(),
        };

        self.keys.push(self.position.position_hash());
        self.played.push((applied.clone(), undo));
        applied
    }

    /// Takes back the most recent move.
    pub fn undo(&mut self) -> Option<AppliedMove> {
        let (applied, undo) = self.played.pop()?;
        self.keys.pop();
        self.position.unmake_move(applied.mv, undo);
        Some(applied)
    }

    pub fn applied(&self) -> impl Iterator<Item = &AppliedMove> {
        self.played.iter().map(|(applied, _)| applied)
    }

    pub fn last_move(&self) -> Option<&AppliedMove> {
        self.played.last().map(|(applied, _)| applied)
    }

    /// SAN of every move played, in order.
    pub fn history(&self) -> Vec<String> {
        self.applied().map(|a| a.san.clone()).collect()
    }

    pub fn ply_count(&self) -> usize {
        self.played.len()
    }

    pub fn is_check(&self) -> bool {
        self.position.in_check(self.position.side_to_move)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        let current = self.position.position_hash();
        self.keys.iter().filter(|&&k| k == current).count() >= 3
    }

    pub fn is_draw(&self) -> bool {
        matches!(self.outcome(), Some(Outcome::Draw(_)))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.legal_moves().is_empty() {
            return Some(if self.is_check() {
                Outcome::Checkmate {
                    winner: self.position.side_to_move.other(),
                }
            } else {
                Outcome::Draw(DrawReason::Stalemate)
            });
        }
        if self.position.is_insufficient_material() {
            return Some(Outcome::Draw(DrawReason::InsufficientMaterial));
        }
        if self.position.is_fifty_move_draw() {
            return Some(Outcome::Draw(DrawReason::FiftyMoveRule));
        }
        if self.is_threefold_repetition() {
            return Some(Outcome::Draw(DrawReason::ThreefoldRepetition));
        }
        None
    }

    /// PGN movetext of the game, ending in its result token.
    pub fn to_pgn(&self) -> String {
        let result = self.outcome().map_or("*", Outcome::result_token);
        write_movetext(&self.history(), result)
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
