//! The immutable move value produced by the generator.

use std::fmt;

use super::{square_to_string, Color, Piece, PieceType, Square};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MoveKind {
    Quiet,
    Capture,
    KingCastle,
    QueenCastle,
    Promotion,
    CapturePromotion,
    EnPassant,
}

/// Origin, destination, what moved, what (if anything) was captured and
/// what a pawn promotes to. Produced only by the move generator or by
/// parsing a UCI string against a board; never mutated.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<PieceType>,
}

impl Move {
    #[inline]
    pub fn color(self) -> Color {
        self.piece.color
    }

    #[inline]
    pub fn is_capture(self) -> bool {
        matches!(self.kind, MoveKind::Capture | MoveKind::CapturePromotion | MoveKind::EnPassant)
    }

    #[inline]
    pub fn is_promotion(self) -> bool {
        matches!(self.kind, MoveKind::Promotion | MoveKind::CapturePromotion)
    }

    /// 4-character origin+destination form, with a lowercase promotion
    /// letter appended where applicable, e.g. `e2e4` or `g7g8q`.
    pub fn to_uci(self) -> String {
        let mut s = square_to_string(self.from);
        s.push_str(&square_to_string(self.to));
        if let Some(promo) = self.promotion {
            s.push(promo.to_char());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}
