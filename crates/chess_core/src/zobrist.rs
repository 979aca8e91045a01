//! Zobrist keys for repetition detection.
//!
//! `Position::position_hash` XORs one key per occupied (piece, square) pair
//! plus keys for black to move, each castling right and the en-passant file.

use crate::types::Piece;

const PIECE_KEYS: usize = 2 * 6 * 64;
const SIDE_KEY: usize = PIECE_KEYS;
const CASTLING_KEYS: usize = SIDE_KEY + 1;
const EP_KEYS: usize = CASTLING_KEYS + 4;
const KEY_COUNT: usize = EP_KEYS + 8;

/// Keys generated at compile time from a fixed seed, so hashes are stable
/// across runs.
pub struct ZobristKeys {
    keys: [u64; KEY_COUNT],
    pub side_to_move: u64,
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl ZobristKeys {
    pub const fn new() -> Self {
        // splitmix64 stream
        const fn next(state: u64) -> (u64, u64) {
            let state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            (state, z ^ (z >> 31))
        }

        let mut keys = [0u64; KEY_COUNT];
        let mut state = 0x00C0_FFEE_D15E_A5E5u64;
        let mut i = 0;
        while i < KEY_COUNT {
            let (s, key) = next(state);
            state = s;
            keys[i] = key;
            i += 1;
        }

        ZobristKeys {
            keys,
            side_to_move: keys[SIDE_KEY],
        }
    }

    #[inline(always)]
    pub fn piece_key(&self, piece: Piece, sq: u8) -> u64 {
        self.keys[(piece.color.idx() * 6 + piece.kind.idx()) * 64 + sq as usize]
    }

    /// Castling right index: 0=wk, 1=wq, 2=bk, 3=bq.
    #[inline(always)]
    pub fn castling_key(&self, index: usize) -> u64 {
        self.keys[CASTLING_KEYS + index]
    }

    #[inline(always)]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.keys[EP_KEYS + file as usize]
    }

    /// Every key, in table order.
    pub fn all(&self) -> &[u64] {
        &self.keys
    }
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
#[path = "zobrist_tests.rs"]
mod zobrist_tests;
