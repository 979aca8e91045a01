//! Minimax search with alpha-beta pruning.
//!
//! White always maximizes and Black always minimizes; scores are absolute
//! centipawns from [`evaluate`].

use chess_core::{legal_moves_into, Color, Move, Position};
use rand::{seq::SliceRandom, Rng};

use crate::eval::evaluate;

/// Score of a side that has been checkmated, signed against it.
pub const MATE_SCORE: i32 = 100_000;

/// Initial alpha/beta window, wider than any mate score.
pub const SEARCH_BOUND: i32 = 100_100;

/// Chooses a move for the side to move in `pos`.
///
/// `depth` counts the root move itself, so `depth = 3` looks at the root
/// move and two replies below it. Root moves are shuffled with `rng` before
/// scoring and ties go to the first candidate in shuffled order. Returns
/// `None` only when there is no legal move.
pub fn pick_best_move<R: Rng + ?Sized>(
    pos: &Position,
    depth: u8,
    rng: &mut R,
    nodes: &mut u64,
) -> Option<(Move, i32)> {
    let mut work = pos.clone();
    let mut moves = Vec::with_capacity(64);
    legal_moves_into(&mut work, &mut moves);
    moves.shuffle(rng);

    let white_to_move = work.side_to_move == Color::White;
    let mut best: Option<(Move, i32)> = None;

    for mv in moves {
        let undo = work.make_move(mv);
        *nodes += 1;
        let score = minimax(
            &mut work,
            depth.saturating_sub(1),
            -SEARCH_BOUND,
            SEARCH_BOUND,
            !white_to_move,
            nodes,
        );
        work.unmake_move(mv, undo);

        let improves = match best {
            None => true,
            Some((_, b)) if white_to_move => score > b,
            Some((_, b)) => score < b,
        };
        if improves {
            best = Some((mv, score));
        }
    }

    best
}

/// Recursive minimax with alpha-beta pruning.
fn minimax(
    pos: &mut Position,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    nodes: &mut u64,
) -> i32 {
    if depth == 0 {
        return evaluate(pos);
    }

    let mut moves = Vec::with_capacity(64);
    legal_moves_into(pos, &mut moves);

    if moves.is_empty() {
        if !pos.in_check(pos.side_to_move) {
            return 0; // Stalemate
        }
        return if maximizing { -MATE_SCORE } else { MATE_SCORE };
    }

    if maximizing {
        let mut best = -MATE_SCORE;
        for mv in moves {
            let undo = pos.make_move(mv);
            *nodes += 1;
            best = best.max(minimax(pos, depth - 1, alpha, beta, false, nodes));
            pos.unmake_move(mv, undo);

            alpha = alpha.max(best);
            if beta <= alpha {
                break; // Beta cutoff
            }
        }
        best
    } else {
        let mut best = MATE_SCORE;
        for mv in moves {
            let undo = pos.make_move(mv);
            *nodes += 1;
            best = best.min(minimax(pos, depth - 1, alpha, beta, true, nodes));
            pos.unmake_move(mv, undo);

            beta = beta.min(best);
            if beta <= alpha {
                break; // Alpha cutoff
            }
        }
        best
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
