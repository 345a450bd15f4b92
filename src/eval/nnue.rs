//! The learned evaluator: a 768 -> (128 x 2) -> 1 perspective network
//! with SCReLU activation, evaluated from two incrementally maintained
//! accumulators.
//!
//! Layout of the weight blob (little-endian i16 throughout):
//! `[768][128]` accumulator weights, `[128]` accumulator biases,
//! `[256]` output weights, then a single output bias. The loader refuses
//! anything that is not exactly that shape.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::{sq, Board, Color, Move, MoveKind, Piece, PieceType, Square};

pub use super::accumulator::{Accumulator, AccumulatorPair, HIDDEN_SIZE};

pub const INPUT_SIZE: usize = 768;

// Quantization constants.
pub const QA: i32 = 255;
pub const QB: i32 = 64;
pub const SCALE: i32 = 400;

pub struct Nnue {
    accumulator_weights: Vec<[i16; HIDDEN_SIZE]>, // one row per input feature
    accumulator_biases: [i16; HIDDEN_SIZE],
    output_weights: [i16; 2 * HIDDEN_SIZE],
    output_bias: i16,
}

/// Feature index of a piece on a square, seen from one perspective. The
/// black perspective re-maps color and mirrors the square rank so the same
/// weight rows serve both sides.
#[inline]
pub fn feature_index(perspective: Color, piece: Piece, sq: Square) -> usize {
    let (color, sq) = match perspective {
        Color::White => (piece.color, sq),
        Color::Black => (piece.color.flip(), sq ^ 56),
    };
    color.index() * 384 + piece.kind.index() * 64 + sq
}

impl Nnue {
    pub const BLOB_LEN: usize =
        2 * (INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + 2 * HIDDEN_SIZE + 1);

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Nnue> {
        let data = fs::read(&path)
            .with_context(|| format!("read network file {}", path.as_ref().display()))?;
        Self::from_bytes(&data)
            .with_context(|| format!("load network file {}", path.as_ref().display()))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Nnue> {
        if data.len() != Self::BLOB_LEN {
            bail!("network blob is {} bytes, expected exactly {}", data.len(), Self::BLOB_LEN);
        }
        let mut words = data.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]]));
        let mut next = || words.next().expect("length checked above");

        let mut accumulator_weights = Vec::with_capacity(INPUT_SIZE);
        for _ in 0..INPUT_SIZE {
            let mut row = [0i16; HIDDEN_SIZE];
            for w in &mut row {
                *w = next();
            }
            accumulator_weights.push(row);
        }
        let mut accumulator_biases = [0i16; HIDDEN_SIZE];
        for b in &mut accumulator_biases {
            *b = next();
        }
        let mut output_weights = [0i16; 2 * HIDDEN_SIZE];
        for w in &mut output_weights {
            *w = next();
        }
        let output_bias = next();

        Ok(Nnue { accumulator_weights, accumulator_biases, output_weights, output_bias })
    }

    /// Serializes in the exact blob layout. Round-trips with `from_bytes`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::BLOB_LEN);
        for row in &self.accumulator_weights {
            for w in row {
                out.extend_from_slice(&w.to_le_bytes());
            }
        }
        for b in &self.accumulator_biases {
            out.extend_from_slice(&b.to_le_bytes());
        }
        for w in &self.output_weights {
            out.extend_from_slice(&w.to_le_bytes());
        }
        out.extend_from_slice(&self.output_bias.to_le_bytes());
        out
    }

    /// Small random network with a fixed seed. The incremental-update
    /// invariants hold for any weights, which makes this enough for the
    /// equivalence tests.
    pub fn random(seed: u64) -> Nnue {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut accumulator_weights = Vec::with_capacity(INPUT_SIZE);
        for _ in 0..INPUT_SIZE {
            let mut row = [0i16; HIDDEN_SIZE];
            for w in &mut row {
                *w = rng.gen_range(-128..128);
            }
            accumulator_weights.push(row);
        }
        let mut accumulator_biases = [0i16; HIDDEN_SIZE];
        for b in &mut accumulator_biases {
            *b = rng.gen_range(-128..128);
        }
        let mut output_weights = [0i16; 2 * HIDDEN_SIZE];
        for w in &mut output_weights {
            *w = rng.gen_range(-64..64);
        }
        let output_bias = rng.gen_range(-64..64);
        Nnue { accumulator_weights, accumulator_biases, output_weights, output_bias }
    }

    /// Builds both accumulators from the mailbox from scratch. The
    /// incremental path must match this bit-for-bit at every ply.
    pub fn recompute(&self, board: &Board) -> AccumulatorPair {
        let mut pair = AccumulatorPair::default();
        for sq in 0..64 {
            if let Some(piece) = board.piece_on(sq) {
                self.add_piece(&mut pair, piece, sq);
            }
        }
        pair.white.add(&self.accumulator_biases);
        pair.black.add(&self.accumulator_biases);
        pair
    }

    #[inline]
    fn add_piece(&self, acc: &mut AccumulatorPair, piece: Piece, sq: Square) {
        acc.white.add(&self.accumulator_weights[feature_index(Color::White, piece, sq)]);
        acc.black.add(&self.accumulator_weights[feature_index(Color::Black, piece, sq)]);
    }

    #[inline]
    fn sub_piece(&self, acc: &mut AccumulatorPair, piece: Piece, sq: Square) {
        acc.white.sub(&self.accumulator_weights[feature_index(Color::White, piece, sq)]);
        acc.black.sub(&self.accumulator_weights[feature_index(Color::Black, piece, sq)]);
    }

    /// Incremental update for one just-played move: remove the mover's old
    /// feature, remove any captured feature, add the mover's new feature
    /// (the promoted piece for promotions), and shuffle the rook pair on
    /// castling.
    pub fn update_on_move(&self, acc: &mut AccumulatorPair, mv: Move) {
        let us = mv.piece.color;
        self.sub_piece(acc, mv.piece, mv.from);

        match mv.kind {
            MoveKind::Capture | MoveKind::CapturePromotion => {
                let captured = mv.captured.expect("capture move carries a victim");
                self.sub_piece(acc, captured, mv.to);
            }
            MoveKind::EnPassant => {
                let victim_sq = if us == Color::White { mv.to - 8 } else { mv.to + 8 };
                self.sub_piece(acc, Piece::new(us.flip(), PieceType::Pawn), victim_sq);
            }
            _ => {}
        }

        let landed = match mv.promotion {
            Some(kind) => Piece::new(us, kind),
            None => mv.piece,
        };
        self.add_piece(acc, landed, mv.to);

        let rook_shuffle = match (mv.kind, us) {
            (MoveKind::KingCastle, Color::White) => Some((sq::H1, sq::F1)),
            (MoveKind::QueenCastle, Color::White) => Some((sq::A1, sq::D1)),
            (MoveKind::KingCastle, Color::Black) => Some((sq::H8, sq::F8)),
            (MoveKind::QueenCastle, Color::Black) => Some((sq::A8, sq::D8)),
            _ => None,
        };
        if let Some((rook_from, rook_to)) = rook_shuffle {
            let rook = Piece::new(us, PieceType::Rook);
            self.sub_piece(acc, rook, rook_from);
            self.add_piece(acc, rook, rook_to);
        }
    }

    /// Centipawn score from the side to move's perspective.
    pub fn evaluate(&self, board: &Board) -> i32 {
        let acc = board.accumulators();
        let (stm, ntm) = match board.turn() {
            Color::White => (&acc.white, &acc.black),
            Color::Black => (&acc.black, &acc.white),
        };
        let mut eval = screlu_fused_sum(&stm.values, &ntm.values, &self.output_weights);
        eval /= QA;
        eval += self.output_bias as i32;
        eval * SCALE / (QA * QB)
    }
}

/// Fused SCReLU-and-dot inner loop: clip each accumulator lane to
/// [0, QA], square it, weight it, sum over both perspectives. Written over
/// fixed-size chunks so the optimizer can vectorize it;
/// `screlu_fused_sum_reference` is the plain scalar rendition the tests
/// hold it equal to.
pub fn screlu_fused_sum(
    stm: &[i16; HIDDEN_SIZE],
    ntm: &[i16; HIDDEN_SIZE],
    weights: &[i16; 2 * HIDDEN_SIZE],
) -> i32 {
    let (w_stm, w_ntm) = weights.split_at(HIDDEN_SIZE);
    let mut total = 0i32;
    for (values, side_weights) in [(&stm[..], w_stm), (&ntm[..], w_ntm)] {
        for (chunk_v, chunk_w) in values.chunks_exact(8).zip(side_weights.chunks_exact(8)) {
            let mut lane = 0i32;
            for (&v, &w) in chunk_v.iter().zip(chunk_w) {
                let c = (v as i32).clamp(0, QA);
                lane += c * c * w as i32;
            }
            total += lane;
        }
    }
    total
}

/// Scalar reference for the fused loop above.
pub fn screlu_fused_sum_reference(
    stm: &[i16; HIDDEN_SIZE],
    ntm: &[i16; HIDDEN_SIZE],
    weights: &[i16; 2 * HIDDEN_SIZE],
) -> i32 {
    let mut total = 0i32;
    for i in 0..HIDDEN_SIZE {
        let s = (stm[i] as i32).clamp(0, QA);
        let n = (ntm[i] as i32).clamp(0, QA);
        total += s * s * weights[i] as i32;
        total += n * n * weights[HIDDEN_SIZE + i] as i32;
    }
    total
}
