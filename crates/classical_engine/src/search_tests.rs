use super::*;
use chess_core::{legal_moves, move_to_uci};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::Difficulty;

fn search(fen: &str, depth: u8) -> Option<(String, i32)> {
    let pos = Position::from_fen(fen).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let mut nodes = 0;
    pick_best_move(&pos, depth, &mut rng, &mut nodes).map(|(mv, s)| (move_to_uci(mv), s))
}

/// Minimax without pruning, used to check the pruned search.
fn plain_minimax(pos: &mut Position, depth: u8, maximizing: bool) -> i32 {
    if depth == 0 {
        return evaluate(pos);
    }
    let moves = legal_moves(pos);
    if moves.is_empty() {
        if !pos.in_check(pos.side_to_move) {
            return 0;
        }
        return if maximizing { -MATE_SCORE } else { MATE_SCORE };
    }
    let scores = moves.into_iter().map(|mv| {
        let undo = pos.make_move(mv);
        let s = plain_minimax(pos, depth - 1, !maximizing);
        pos.unmake_move(mv, undo);
        s
    });
    if maximizing {
        scores.max().unwrap_or(-MATE_SCORE)
    } else {
        scores.min().unwrap_or(MATE_SCORE)
    }
}

#[test]
fn start_position_search_leaves_input_untouched() {
    let pos = Position::startpos();
    let before = pos.clone();
    let mut rng = StdRng::seed_from_u64(1);
    let mut nodes = 0;
    let result = pick_best_move(&pos, 3, &mut rng, &mut nodes);
    assert!(result.is_some());
    assert!(nodes > 20);
    assert_eq!(pos, before);
}

#[test]
fn white_finds_back_rank_mate() {
    let (mv, score) = search("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1", 2).unwrap();
    assert_eq!(mv, "e1e8");
    assert_eq!(score, MATE_SCORE);
}

#[test]
fn black_finds_back_rank_mate() {
    let (mv, score) = search("4q1k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 2).unwrap();
    assert_eq!(mv, "e8e1");
    assert_eq!(score, -MATE_SCORE);
}

#[test]
fn black_takes_a_hanging_queen() {
    let (mv, score) = search("4k3/8/4n3/8/3Q4/8/8/4K3 b - - 0 1", 2).unwrap();
    assert_eq!(mv, "e6d4");
    assert!(score < 0);
}

#[test]
fn no_legal_moves_gives_none() {
    // Fool's mate, White to move and mated
    let mated = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    assert!(search(mated, 3).is_none());
    // Stalemate
    assert!(search("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1", 2).is_none());
}

#[test]
fn pruning_does_not_change_the_root_score() {
    let fens = [
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
        "6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1",
    ];
    for fen in fens {
        let mut pos = Position::from_fen(fen).unwrap();
        let white = pos.side_to_move == Color::White;
        let expected = plain_minimax(&mut pos, 3, white);
        let (_, score) = search(fen, 3).unwrap();
        assert_eq!(score, expected, "{fen}");
    }
}

#[test]
fn easy_search_visits_every_reply_at_the_root() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut nodes = 0;
    pick_best_move(
        &Position::startpos(),
        Difficulty::Easy.search_depth(),
        &mut rng,
        &mut nodes,
    );
    assert_eq!(nodes, 20 + 20 * 20);
}

#[test]
fn chosen_moves_are_always_legal() {
    let mut walk = StdRng::seed_from_u64(42);
    let mut pos = Position::startpos();
    let mut checked = 0;

    for _ in 0..12 {
        let legal = legal_moves(&pos);
        if legal.is_empty() {
            break;
        }
        for difficulty in Difficulty::ALL {
            let before = pos.clone();
            let mut rng = StdRng::seed_from_u64(checked);
            let mut nodes = 0;
            let (mv, _) =
                pick_best_move(&pos, difficulty.search_depth(), &mut rng, &mut nodes).unwrap();
            assert!(
                legal.contains(&mv),
                "{} is not legal in {}",
                move_to_uci(mv),
                pos.to_fen()
            );
            assert_eq!(pos, before);
            checked += 1;
        }
        let next = *legal.choose(&mut walk).unwrap();
        pos.make_move(next);
    }
    assert!(checked >= 3);
}
