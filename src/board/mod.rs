//! Board representation: bitboards, the mailbox, move make/unmake and
//! legal move generation.

pub mod attacks;
pub mod bitboard;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use moves::{Move, MoveKind};
pub use position::{Board, CastlingRights, FenError, MoveParseError};

/// Square index, 0 = a1 through 63 = h8 (little-endian rank-file).
pub type Square = usize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub fn flip(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction pawns of this color push toward.
    #[inline]
    pub fn pawn_push(self) -> bitboard::Direction {
        match self {
            Color::White => bitboard::Direction::North,
            Color::Black => bitboard::Direction::South,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    pub fn to_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<PieceType> {
        Some(match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        })
    }
}

/// A colored piece. The mailbox stores `Option<Piece>` per square.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
}

impl Piece {
    #[inline]
    pub fn new(color: Color, kind: PieceType) -> Piece {
        Piece { color, kind }
    }

    /// Index into the 12-wide per-piece bitboard array.
    #[inline]
    pub fn index(self) -> usize {
        self.color.index() * 6 + self.kind.index()
    }

    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceType::from_char(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece::new(color, kind))
    }
}

#[inline]
pub fn file_of(sq: Square) -> usize {
    sq & 7
}

#[inline]
pub fn rank_of(sq: Square) -> usize {
    sq >> 3
}

pub fn square_to_string(sq: Square) -> String {
    let mut s = String::with_capacity(2);
    s.push((b'a' + file_of(sq) as u8) as char);
    s.push((b'1' + rank_of(sq) as u8) as char);
    s
}

pub fn square_from_string(s: &str) -> Option<Square> {
    let b = s.as_bytes();
    if b.len() != 2 || !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) {
        return None;
    }
    Some(((b[1] - b'1') as usize) * 8 + (b[0] - b'a') as usize)
}

/// Named square constants, LERM ordering.
#[rustfmt::skip]
pub mod sq {
    use super::Square;
    pub const A1: Square = 0;  pub const B1: Square = 1;  pub const C1: Square = 2;  pub const D1: Square = 3;
    pub const E1: Square = 4;  pub const F1: Square = 5;  pub const G1: Square = 6;  pub const H1: Square = 7;
    pub const A2: Square = 8;  pub const B2: Square = 9;  pub const C2: Square = 10; pub const D2: Square = 11;
    pub const E2: Square = 12; pub const F2: Square = 13; pub const G2: Square = 14; pub const H2: Square = 15;
    pub const A3: Square = 16; pub const B3: Square = 17; pub const C3: Square = 18; pub const D3: Square = 19;
    pub const E3: Square = 20; pub const F3: Square = 21; pub const G3: Square = 22; pub const H3: Square = 23;
    pub const A4: Square = 24; pub const B4: Square = 25; pub const C4: Square = 26; pub const D4: Square = 27;
    pub const E4: Square = 28; pub const F4: Square = 29; pub const G4: Square = 30; pub const H4: Square = 31;
    pub const A5: Square = 32; pub const B5: Square = 33; pub const C5: Square = 34; pub const D5: Square = 35;
    pub const E5: Square = 36; pub const F5: Square = 37; pub const G5: Square = 38; pub const H5: Square = 39;
    pub const A6: Square = 40; pub const B6: Square = 41; pub const C6: Square = 42; pub const D6: Square = 43;
    pub const E6: Square = 44; pub const F6: Square = 45; pub const G6: Square = 46; pub const H6: Square = 47;
    pub const A7: Square = 48; pub const B7: Square = 49; pub const C7: Square = 50; pub const D7: Square = 51;
    pub const E7: Square = 52; pub const F7: Square = 53; pub const G7: Square = 54; pub const H7: Square = 55;
    pub const A8: Square = 56; pub const B8: Square = 57; pub const C8: Square = 58; pub const D8: Square = 59;
    pub const E8: Square = 60; pub const F8: Square = 61; pub const G8: Square = 62; pub const H8: Square = 63;
}
