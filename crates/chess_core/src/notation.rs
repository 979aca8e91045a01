//! Move notation: Standard Algebraic Notation and coordinate (UCI) text.

use crate::{
    board::Position,
    movegen::{has_legal_move, legal_moves},
    types::*,
};

/// SAN for a legal move in `pos`, including disambiguation and the `+`/`#`
/// suffix.
pub fn move_to_san(pos: &Position, mv: Move) -> String {
    let Some(piece) = pos.piece_at(mv.from) else {
        return move_to_uci(mv);
    };

    let mut san = if mv.is_castle {
        if file_of(mv.to) > file_of(mv.from) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let capture = pos.piece_at(mv.to).is_some() || mv.is_en_passant;
        let mut s = String::with_capacity(8);

        if piece.kind == PieceKind::Pawn {
            if capture {
                s.push((b'a' + (mv.from % 8)) as char);
            }
        } else {
            s.push(piece.kind.letter());
            s.push_str(&disambiguation(pos, mv, piece.kind));
        }

        if capture {
            s.push('x');
        }
        s.push_str(&sq_to_coord(mv.to));

        if let Some(promo) = mv.promo {
            s.push('=');
            s.push(promo.letter());
        }
        s
    };

    let mut after = pos.clone();
    after.make_move(mv);
    if after.in_check(after.side_to_move) {
        san.push(if has_legal_move(&after) { '+' } else { '#' });
    }
    san
}

/// File, rank, or both, when another piece of the same kind can reach the
/// same square.
fn disambiguation(pos: &Position, mv: Move, kind: PieceKind) -> String {
    let rivals: Vec<u8> = legal_moves(pos)
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && pos.piece_at(other.from).map(|p| p.kind) == Some(kind)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let coord = sq_to_coord(mv.from);
    let (file, rank) = coord.split_at(1);
    if !rivals.iter().any(|&r| file_of(r) == file_of(mv.from)) {
        file.to_string()
    } else if !rivals.iter().any(|&r| rank_of(r) == rank_of(mv.from)) {
        rank.to_string()
    } else {
        coord
    }
}

/// Strips check/annotation marks and normalizes castling zeros so SAN from
/// other tools compares equal to ours.
fn normalize_san(text: &str) -> String {
    text.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
        .replace('=', "")
}

/// Finds the legal move in `pos` written as `text` in SAN.
pub fn parse_san(pos: &Position, text: &str) -> Option<Move> {
    let wanted = normalize_san(text);
    if wanted.is_empty() {
        return None;
    }
    legal_moves(pos)
        .into_iter()
        .find(|&mv| normalize_san(&move_to_san(pos, mv)) == wanted)
}

pub fn move_to_uci(mv: Move) -> String {
    let mut s = String::new();
    s.push_str(&sq_to_coord(mv.from));
    s.push_str(&sq_to_coord(mv.to));
    if let Some(p) = mv.promo {
        s.push(p.letter().to_ascii_lowercase());
    }
    s
}

/// Parses coordinate text such as `e2e4` or `e7e8n`. A promotion without a
/// piece letter becomes a queen.
pub fn parse_uci_move(pos: &Position, txt: &str) -> Option<Move> {
    if !txt.is_ascii() || txt.len() < 4 {
        return None;
    }
    let from = coord_to_sq(&txt[0..2])?;
    let to = coord_to_sq(&txt[2..4])?;
    let promo = match txt[4..].chars().next() {
        Some(c) => Some(PieceKind::from_letter(c).filter(|k| {
            !matches!(k, PieceKind::Pawn | PieceKind::King)
        })?),
        None => None,
    };

    let candidates: Vec<Move> = legal_moves(pos)
        .into_iter()
        .filter(|m| m.from == from && m.to == to)
        .collect();
    let wanted = promo.or(Some(PieceKind::Queen));
    candidates
        .iter()
        .copied()
        .find(|m| m.promo.is_none() || m.promo == wanted)
}

#[cfg(test)]
#[path = "notation_tests.rs"]
mod notation_tests;
