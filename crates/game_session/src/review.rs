//! Move-by-move replay of archived matches.

use chess_core::{AppliedMove, Game, Position};
use classical_engine::{classify, evaluate, QualityLabel};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{SessionError, StoreError},
    record::MatchRecord,
    store::MatchStore,
};

/// One replayed move with its evaluation and quality label.
#[derive(Debug, Clone)]
pub struct ReviewedMove {
    pub applied: AppliedMove,
    /// Evaluation of the position after the move.
    pub evaluation: i32,
    pub quality: QualityLabel,
}

#[derive(Debug, Clone)]
pub struct MatchReview {
    record: MatchRecord,
    start: Position,
    moves: Vec<ReviewedMove>,
}

impl MatchReview {
    /// Replays `record` from the standard start position.
    pub fn replay(record: &MatchRecord) -> Result<Self, SessionError> {
        let mut game = Game::new();
        let mut moves = Vec::with_capacity(record.moves.len());

        for (i, san) in record.moves.iter().enumerate() {
            let applied = game
                .play_san(san)
                .map_err(|_| SessionError::CorruptedRecord {
                    id: record.id,
                    ply: i + 1,
                    san: san.clone(),
                })?;
            moves.push(ReviewedMove {
                evaluation: evaluate(&applied.after),
                quality: classify(&applied.before, &applied.after, applied.color),
                applied,
            });
        }

        Ok(Self {
            record: record.clone(),
            start: Position::startpos(),
            moves,
        })
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    pub fn moves(&self) -> &[ReviewedMove] {
        &self.moves
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Position after `ply` moves; ply 0 is the start position.
    pub fn position_at(&self, ply: usize) -> Option<&Position> {
        match ply {
            0 => Some(&self.start),
            n => self.moves.get(n - 1).map(|m| &m.applied.after),
        }
    }

    /// Evaluation after each move, in centipawns.
    pub fn evaluation_graph(&self) -> Vec<i32> {
        self.moves.iter().map(|m| m.evaluation).collect()
    }

    pub fn quality_at(&self, ply: usize) -> Option<QualityLabel> {
        ply.checked_sub(1)
            .and_then(|i| self.moves.get(i))
            .map(|m| m.quality)
    }
}

/// A library record together with its replay, or why it failed.
#[derive(Debug)]
pub struct LibraryEntry {
    pub record: MatchRecord,
    pub review: Result<MatchReview, SessionError>,
}

/// Lists the archive most recent first, replaying every record. A record
/// that fails to replay is reported in its own entry.
pub fn load_library(store: &dyn MatchStore) -> Result<Vec<LibraryEntry>, StoreError> {
    let records = store.list_match_records()?;
    Ok(records
        .into_iter()
        .map(|record| {
            let review = MatchReview::replay(&record);
            if let Err(e) = &review {
                warn!(id = %record.id, error = %e, "match failed to replay");
            }
            LibraryEntry { record, review }
        })
        .collect())
}

/// Replays one archived match by id. `Ok(None)` when no such match exists.
pub fn review_match(store: &dyn MatchStore, id: Uuid) -> Result<Option<MatchReview>, SessionError> {
    let records = store.list_match_records()?;
    records
        .iter()
        .find(|r| r.id == id)
        .map(MatchReview::replay)
        .transpose()
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod review_tests;
