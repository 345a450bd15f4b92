//! Position evaluation: the NNUE network with its incremental
//! accumulators, and the classical fallback used when no weights are
//! loaded.

pub mod accumulator;
pub mod classical;
pub mod nnue;

pub use accumulator::{Accumulator, AccumulatorPair, HIDDEN_SIZE};
pub use nnue::Nnue;

use crate::board::{Board, Color};

/// Centipawn score from the side to move's perspective (negamax-friendly).
pub fn evaluate(board: &Board, net: Option<&Nnue>) -> i32 {
    match net {
        Some(net) => net.evaluate(board),
        None => {
            let white_score = classical::evaluate(board);
            match board.turn() {
                Color::White => white_score,
                Color::Black => -white_score,
            }
        }
    }
}
