//! Zobrist keys for incremental position hashing.

use std::sync::OnceLock;

use super::position::Board;
use super::{file_of, Piece, Square};

pub struct ZobristKeys {
    pub pieces: [[u64; 64]; 12],
    pub castling: [u64; 4],
    pub en_passant_file: [u64; 8],
    pub side_to_move: u64,
}

fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(|| {
        let mut seed = 0xF00D_F00D_DEAD_BEEF;
        let mut pieces = [[0u64; 64]; 12];
        for row in &mut pieces {
            for v in row.iter_mut() {
                *v = splitmix64(&mut seed);
            }
        }
        let mut castling = [0u64; 4];
        for v in &mut castling {
            *v = splitmix64(&mut seed);
        }
        let mut en_passant_file = [0u64; 8];
        for v in &mut en_passant_file {
            *v = splitmix64(&mut seed);
        }
        let side_to_move = splitmix64(&mut seed);
        ZobristKeys { pieces, castling, en_passant_file, side_to_move }
    })
}

#[inline]
pub fn piece_key(piece: Piece, sq: Square) -> u64 {
    keys().pieces[piece.index()][sq]
}

#[inline]
pub fn en_passant_key(sq: Square) -> u64 {
    keys().en_passant_file[file_of(sq)]
}

#[inline]
pub fn side_key() -> u64 {
    keys().side_to_move
}

/// Full recompute from the mailbox. Used at position setup and by the
/// consistency check; the board maintains the hash incrementally otherwise.
pub fn compute(board: &Board) -> u64 {
    let k = keys();
    let mut hash = 0u64;
    for sq in 0..64 {
        if let Some(piece) = board.piece_on(sq) {
            hash ^= k.pieces[piece.index()][sq];
        }
    }
    let castling = board.castling();
    for (i, set) in [castling.wk, castling.wq, castling.bk, castling.bq].into_iter().enumerate() {
        if set {
            hash ^= k.castling[i];
        }
    }
    if let Some(ep) = board.en_passant() {
        hash ^= k.en_passant_file[file_of(ep)];
    }
    if board.turn() == super::Color::Black {
        hash ^= k.side_to_move;
    }
    hash
}
