use super::*;
use crate::movegen::legal_moves;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[test]
fn startpos_matches_standard_fen() {
    assert_eq!(Position::startpos().to_fen(), START_FEN);
    assert_eq!(Position::from_fen(START_FEN).unwrap(), Position::startpos());
}

#[test]
fn fen_round_trips() {
    for fen in [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        "4k3/8/8/8/8/8/8/4K2R w K - 37 80",
    ] {
        assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
    }
}

#[test]
fn fen_counters_default_when_missing() {
    let pos = Position::from_fen("8/8/8/4k3/8/4K3/8/8 w - -").unwrap();
    assert_eq!(pos.halfmove_clock, 0);
    assert_eq!(pos.fullmove_number, 1);
}

#[test]
fn malformed_fen_is_rejected() {
    assert_eq!(Position::from_fen("8/8/8 w"), Err(FenError::MissingFields(2)));
    assert_eq!(
        Position::from_fen("8/8/8/8/8/8/8 w - -"),
        Err(FenError::RankCount(7))
    );
    assert_eq!(
        Position::from_fen("8/8/8/8/8/8/8/7 w - -"),
        Err(FenError::RankWidth { rank: 7 })
    );
    assert_eq!(
        Position::from_fen("8/8/8/8/8/8/8/7x w - -"),
        Err(FenError::Piece('x'))
    );
    assert!(matches!(
        Position::from_fen("8/8/8/8/8/8/8/8 x - -"),
        Err(FenError::SideToMove(_))
    ));
    assert!(matches!(
        Position::from_fen("8/8/8/8/8/8/8/8 w - - zero 1"),
        Err(FenError::Counter(_))
    ));
}

#[test]
fn make_then_unmake_restores_every_field() {
    let fens = [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        "r3k2r/1P6/8/8/8/8/6p1/R3K2R b KQkq - 0 1",
    ];
    for fen in fens {
        let original = Position::from_fen(fen).unwrap();
        for mv in legal_moves(&original) {
            let mut pos = original.clone();
            let undo = pos.make_move(mv);
            assert_ne!(pos, original);
            pos.unmake_move(mv, undo);
            assert_eq!(pos, original, "round trip failed for {mv:?} in {fen}");
        }
    }
}

#[test]
fn castling_moves_the_rook_and_clears_rights() {
    let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let mut mv = Move::new(4, 6);
    mv.is_castle = true;
    pos.make_move(mv);
    assert_eq!(pos.piece_at(5).map(|p| p.kind), Some(PieceKind::Rook));
    assert!(pos.piece_at(7).is_none());
    assert!(!pos.castling.wk && !pos.castling.wq);
    assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/R4RK1 b - - 1 1");
}

#[test]
fn promotion_defaults_to_queen() {
    let mut pos = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    pos.make_move(Move::new(48, 56));
    assert_eq!(
        pos.piece_at(56),
        Some(Piece::new(Color::White, PieceKind::Queen))
    );
}

#[test]
fn en_passant_square_only_hashes_when_capturable() {
    let hash = |fen: &str| Position::from_fen(fen).unwrap().position_hash();

    // No white pawn beside d5: the square changes nothing.
    assert_eq!(
        hash("4k3/8/8/3p4/8/8/8/4K3 w - d6 0 1"),
        hash("4k3/8/8/3p4/8/8/8/4K3 w - - 0 1")
    );
    // exd6 is available.
    assert_ne!(
        hash("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1"),
        hash("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1")
    );
    // Black to move with a pawn on f4 next to e4.
    assert_ne!(
        hash("4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 1"),
        hash("4k3/8/8/8/4Pp2/8/8/4K3 b - - 0 1")
    );
}
