//! Static exchange evaluation: simulate the least-valuable-attacker
//! recapture sequence on one square over a copy of the occupancy mask,
//! re-deriving revealed sliders after each removal. No board mutation.

use crate::board::attacks;
use crate::board::bitboard::{bit_scan, square_bb, Bitboard};
use crate::board::{Board, Color, Move, MoveKind, PieceType, Square};

// Slightly different values than the main evaluation; the king is priced
// so a defended recapture by it ends any sequence.
const SEE_VALUES: [i32; 6] = [100, 325, 325, 500, 975, 10_000];

#[inline]
pub fn piece_value(kind: PieceType) -> i32 {
    SEE_VALUES[kind.index()]
}

/// Least valuable piece of `side` attacking `target` under the given
/// occupancy. Sliders are looked up against the current occupancy so
/// attackers revealed by earlier removals are seen.
fn least_valuable_attacker(
    board: &Board,
    target: Square,
    side: Color,
    occupied: Bitboard,
) -> Option<(Square, PieceType)> {
    let pawns =
        attacks::pawn_attacks(side.flip(), target) & board.pieces_of(PieceType::Pawn, side) & occupied;
    if pawns != 0 {
        return Some((bit_scan(pawns), PieceType::Pawn));
    }
    let knights =
        attacks::knight_attacks(target) & board.pieces_of(PieceType::Knight, side) & occupied;
    if knights != 0 {
        return Some((bit_scan(knights), PieceType::Knight));
    }
    let diagonal = attacks::bishop_attacks(target, occupied)
        & (board.pieces_of(PieceType::Bishop, side) | board.pieces_of(PieceType::Queen, side))
        & occupied;
    if diagonal != 0 {
        let bishops = diagonal & board.pieces_of(PieceType::Bishop, side);
        if bishops != 0 {
            return Some((bit_scan(bishops), PieceType::Bishop));
        }
        return Some((bit_scan(diagonal), PieceType::Queen));
    }
    let orthogonal = attacks::rook_attacks(target, occupied)
        & (board.pieces_of(PieceType::Rook, side) | board.pieces_of(PieceType::Queen, side))
        & occupied;
    if orthogonal != 0 {
        let rooks = orthogonal & board.pieces_of(PieceType::Rook, side);
        if rooks != 0 {
            return Some((bit_scan(rooks), PieceType::Rook));
        }
        return Some((bit_scan(orthogonal), PieceType::Queen));
    }
    let kings = attacks::king_attacks(target) & board.pieces_of(PieceType::King, side) & occupied;
    if kings != 0 {
        return Some((bit_scan(kings), PieceType::King));
    }
    None
}

/// Net material outcome of the capture sequence started by `mv`, in
/// centipawns from the mover's perspective. Non-captures score the
/// promotion gain or zero.
pub fn see(board: &Board, mv: Move) -> i32 {
    match mv.kind {
        MoveKind::Capture | MoveKind::CapturePromotion | MoveKind::EnPassant => {}
        MoveKind::Promotion => {
            return piece_value(mv.promotion.expect("promotion move carries a piece"))
                - piece_value(PieceType::Pawn);
        }
        _ => return 0,
    }

    let target = mv.to;
    let mut occupied = board.occupied() ^ square_bb(mv.from);
    let mut victim_value = piece_value(mv.captured.map_or(PieceType::Pawn, |p| p.kind));
    if mv.kind == MoveKind::EnPassant {
        let ep_victim = if mv.color() == Color::White { mv.to - 8 } else { mv.to + 8 };
        occupied ^= square_bb(ep_victim);
        victim_value = piece_value(PieceType::Pawn);
    }

    let mut gains = [0i32; 32];
    gains[0] = victim_value;
    let mut depth = 0;
    // Value of the piece now standing on the target square.
    let mut occupant_value = match mv.promotion {
        Some(kind) => piece_value(kind),
        None => piece_value(mv.piece.kind),
    };
    let mut side = mv.color().flip();

    loop {
        let Some((from, attacker)) = least_valuable_attacker(board, target, side, occupied) else {
            break;
        };
        depth += 1;
        if depth >= gains.len() {
            break;
        }
        gains[depth] = occupant_value - gains[depth - 1];
        occupied ^= square_bb(from);
        occupant_value = piece_value(attacker);
        side = side.flip();
        // A king recapture that could itself be answered is illegal; the
        // inflated king value makes the fold discard such tails anyway.
    }

    // Fold backwards: each side may stop capturing when that is better.
    for i in (0..depth).rev() {
        gains[i] = gains[i].min(-gains[i + 1]);
    }
    gains[0]
}

/// Whether the exchange started by `mv` nets at least `threshold`
/// centipawns.
pub fn see_ge(board: &Board, mv: Move, threshold: i32) -> bool {
    see(board, mv) >= threshold
}
