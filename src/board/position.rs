//! The mutable position: dual bitboard/mailbox representation, castling
//! and en-passant state, the history stack that makes exact undo possible,
//! the incrementally maintained Zobrist hash and evaluator accumulators.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::eval::nnue::{AccumulatorPair, Nnue};

use super::bitboard::{bit_scan, square_bb, Bitboard};
use super::{attacks, sq, zobrist};
use super::{square_from_string, square_to_string, Color, Move, MoveKind, Piece, PieceType, Square};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CastlingRights {
    pub wk: bool,
    pub wq: bool,
    pub bk: bool,
    pub bq: bool,
}

impl CastlingRights {
    fn hash(self) -> u64 {
        let keys = zobrist::keys();
        let mut h = 0u64;
        for (i, set) in [self.wk, self.wq, self.bk, self.bq].into_iter().enumerate() {
            if set {
                h ^= keys.castling[i];
            }
        }
        h
    }
}

#[derive(Debug, Error)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, got {0}")]
    FieldCount(usize),
    #[error("bad piece placement: {0}")]
    Placement(String),
    #[error("bad side to move: {0}")]
    SideToMove(String),
    #[error("bad castling rights: {0}")]
    Castling(String),
    #[error("bad en passant square: {0}")]
    EnPassant(String),
    #[error("bad move counter: {0}")]
    Counter(String),
}

#[derive(Debug, Error)]
pub enum MoveParseError {
    #[error("malformed move string: {0}")]
    Malformed(String),
    #[error("illegal move in this position: {0}")]
    Illegal(String),
}

/// Everything make_move cannot cheaply re-derive, captured before the
/// mutation so undo can restore every field verbatim. `mv` is None for a
/// null move.
#[derive(Clone)]
struct Undo {
    mv: Option<Move>,
    castling: CastlingRights,
    en_passant: Option<Square>,
    zobrist: u64,
    halfmove_clock: u32,
    fullmove_number: u32,
    accumulators: AccumulatorPair,
}

pub struct Board {
    pub(crate) pieces: [Bitboard; 12],
    pub(crate) colors: [Bitboard; 2],
    pub(crate) occupied: Bitboard,
    pub(crate) empty: Bitboard,
    pub(crate) squares: [Option<Piece>; 64],
    pub(crate) turn: Color,
    pub(crate) en_passant: Option<Square>,
    pub(crate) castling: CastlingRights,
    halfmove_clock: u32,
    fullmove_number: u32,
    zobrist: u64,
    accumulators: AccumulatorPair,
    history: Vec<Undo>,
    nnue: Option<Arc<Nnue>>,
}

impl Board {
    fn blank() -> Board {
        Board {
            pieces: [0; 12],
            colors: [0; 2],
            occupied: 0,
            empty: !0,
            squares: [None; 64],
            turn: Color::White,
            en_passant: None,
            castling: CastlingRights::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
            zobrist: 0,
            accumulators: AccumulatorPair::default(),
            history: Vec::with_capacity(256),
            nnue: None,
        }
    }

    /// The hard-coded standard starting position.
    pub fn start_pos() -> Board {
        attacks::init();
        let mut b = Board::blank();
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            b.put_piece(Piece::new(Color::White, kind), file);
            b.put_piece(Piece::new(Color::Black, kind), 56 + file);
        }
        for file in 0..8 {
            b.put_piece(Piece::new(Color::White, PieceType::Pawn), 8 + file);
            b.put_piece(Piece::new(Color::Black, PieceType::Pawn), 48 + file);
        }
        b.castling = CastlingRights { wk: true, wq: true, bk: true, bq: true };
        b.zobrist = zobrist::compute(&b);
        b
    }

    /// Parses a 6-field FEN string (the move counters may be omitted).
    /// The board is only constructed if every field parses; a malformed
    /// string never yields a half-initialized position.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        attacks::init();
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut b = Board::blank();
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(fields[0].to_string()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                } else {
                    let piece = Piece::from_char(ch)
                        .ok_or_else(|| FenError::Placement(rank_str.to_string()))?;
                    if file > 7 {
                        return Err(FenError::Placement(rank_str.to_string()));
                    }
                    b.put_piece(piece, rank * 8 + file);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::Placement(rank_str.to_string()));
            }
        }
        for color in [Color::White, Color::Black] {
            if b.pieces_of(PieceType::King, color).count_ones() != 1 {
                return Err(FenError::Placement("side without exactly one king".to_string()));
            }
        }

        b.turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        if fields[2] != "-" {
            for ch in fields[2].chars() {
                match ch {
                    'K' => b.castling.wk = true,
                    'Q' => b.castling.wq = true,
                    'k' => b.castling.bk = true,
                    'q' => b.castling.bq = true,
                    _ => return Err(FenError::Castling(fields[2].to_string())),
                }
            }
        }

        if fields[3] != "-" {
            let ep = square_from_string(fields[3])
                .ok_or_else(|| FenError::EnPassant(fields[3].to_string()))?;
            b.en_passant = Some(ep);
        }

        if let Some(half) = fields.get(4) {
            b.halfmove_clock =
                half.parse().map_err(|_| FenError::Counter(half.to_string()))?;
        }
        if let Some(full) = fields.get(5) {
            b.fullmove_number =
                full.parse().map_err(|_| FenError::Counter(full.to_string()))?;
        }

        b.zobrist = zobrist::compute(&b);
        Ok(b)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty_run = 0;
            for file in 0..8 {
                match self.squares[rank * 8 + file] {
                    Some(p) => {
                        if empty_run > 0 {
                            fen.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        fen.push(p.to_char());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push_str(&empty_run.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen.push(' ');
        fen.push(if self.turn == Color::White { 'w' } else { 'b' });
        fen.push(' ');
        if !(self.castling.wk || self.castling.wq || self.castling.bk || self.castling.bq) {
            fen.push('-');
        } else {
            if self.castling.wk {
                fen.push('K');
            }
            if self.castling.wq {
                fen.push('Q');
            }
            if self.castling.bk {
                fen.push('k');
            }
            if self.castling.bq {
                fen.push('q');
            }
        }
        fen.push(' ');
        match self.en_passant {
            Some(ep) => fen.push_str(&square_to_string(ep)),
            None => fen.push('-'),
        }
        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    // Accessors

    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    #[inline]
    pub fn zobrist(&self) -> u64 {
        self.zobrist
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    #[inline]
    pub fn empty(&self) -> Bitboard {
        self.empty
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.squares[sq]
    }

    #[inline]
    pub fn pieces_of(&self, kind: PieceType, color: Color) -> Bitboard {
        self.pieces[Piece::new(color, kind).index()]
    }

    #[inline]
    pub fn color_bb(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    #[inline]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn accumulators(&self) -> &AccumulatorPair {
        &self.accumulators
    }

    pub fn evaluator(&self) -> Option<&Arc<Nnue>> {
        self.nnue.as_ref()
    }

    /// Attaches the network whose accumulators this board maintains
    /// incrementally, refreshing them from the current position.
    pub fn set_evaluator(&mut self, net: Arc<Nnue>) {
        self.accumulators = net.recompute(self);
        self.nnue = Some(net);
    }

    // Mutation primitives. These are the only writers of the bitboards and
    // the mailbox, so the two views cannot drift apart.

    fn put_piece(&mut self, p: Piece, sq: Square) {
        let bb = square_bb(sq);
        self.pieces[p.index()] |= bb;
        self.colors[p.color.index()] |= bb;
        self.occupied |= bb;
        self.empty = !self.occupied;
        self.squares[sq] = Some(p);
        self.zobrist ^= zobrist::piece_key(p, sq);
    }

    fn remove_piece(&mut self, p: Piece, sq: Square) {
        let bb = square_bb(sq);
        self.pieces[p.index()] ^= bb;
        self.colors[p.color.index()] ^= bb;
        self.occupied ^= bb;
        self.empty = !self.occupied;
        self.squares[sq] = None;
        self.zobrist ^= zobrist::piece_key(p, sq);
    }

    fn move_piece(&mut self, p: Piece, from: Square, to: Square) {
        let from_to = square_bb(from) ^ square_bb(to);
        self.pieces[p.index()] ^= from_to;
        self.colors[p.color.index()] ^= from_to;
        self.occupied ^= from_to;
        self.empty = !self.occupied;
        self.squares[from] = None;
        self.squares[to] = Some(p);
        self.zobrist ^= zobrist::piece_key(p, from) ^ zobrist::piece_key(p, to);
    }

    fn capture_piece(&mut self, p: Piece, q: Piece, from: Square, to: Square) {
        let from_bb = square_bb(from);
        let to_bb = square_bb(to);
        self.pieces[q.index()] ^= to_bb;
        self.colors[q.color.index()] ^= to_bb;
        self.pieces[p.index()] ^= from_bb ^ to_bb;
        self.colors[p.color.index()] ^= from_bb ^ to_bb;
        self.occupied ^= from_bb;
        self.empty = !self.occupied;
        self.squares[from] = None;
        self.squares[to] = Some(p);
        self.zobrist ^= zobrist::piece_key(q, to)
            ^ zobrist::piece_key(p, from)
            ^ zobrist::piece_key(p, to);
    }

    fn replace_piece(&mut self, p: Piece, q: Piece, sq: Square) {
        let bb = square_bb(sq);
        self.pieces[p.index()] ^= bb;
        self.pieces[q.index()] ^= bb;
        self.squares[sq] = Some(q);
        self.zobrist ^= zobrist::piece_key(p, sq) ^ zobrist::piece_key(q, sq);
    }

    fn rook_castle_squares(color: Color, kind: MoveKind) -> (Square, Square) {
        match (color, kind) {
            (Color::White, MoveKind::KingCastle) => (sq::H1, sq::F1),
            (Color::White, _) => (sq::A1, sq::D1),
            (Color::Black, MoveKind::KingCastle) => (sq::H8, sq::F8),
            (Color::Black, _) => (sq::A8, sq::D8),
        }
    }

    /// Applies a move produced by the generator (or parsed against this
    /// position). State that undo cannot re-derive is pushed first.
    pub fn make_move(&mut self, mv: Move) {
        self.history.push(Undo {
            mv: Some(mv),
            castling: self.castling,
            en_passant: self.en_passant,
            zobrist: self.zobrist,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            accumulators: self.accumulators,
        });

        let us = mv.piece.color;

        if let Some(ep) = self.en_passant.take() {
            self.zobrist ^= zobrist::en_passant_key(ep);
        }

        match mv.kind {
            MoveKind::Quiet => {
                self.move_piece(mv.piece, mv.from, mv.to);
                if mv.piece.kind == PieceType::Pawn && mv.from.abs_diff(mv.to) == 16 {
                    let ep = (mv.from + mv.to) / 2;
                    self.en_passant = Some(ep);
                    self.zobrist ^= zobrist::en_passant_key(ep);
                }
            }
            MoveKind::Capture => {
                let captured = mv.captured.expect("capture move carries a victim");
                self.capture_piece(mv.piece, captured, mv.from, mv.to);
            }
            MoveKind::Promotion => {
                let promoted =
                    Piece::new(us, mv.promotion.expect("promotion move carries a piece"));
                self.move_piece(mv.piece, mv.from, mv.to);
                self.replace_piece(mv.piece, promoted, mv.to);
            }
            MoveKind::CapturePromotion => {
                let captured = mv.captured.expect("capture move carries a victim");
                let promoted =
                    Piece::new(us, mv.promotion.expect("promotion move carries a piece"));
                self.capture_piece(mv.piece, captured, mv.from, mv.to);
                self.replace_piece(mv.piece, promoted, mv.to);
            }
            MoveKind::KingCastle | MoveKind::QueenCastle => {
                let (rook_from, rook_to) = Board::rook_castle_squares(us, mv.kind);
                self.move_piece(mv.piece, mv.from, mv.to);
                self.move_piece(Piece::new(us, PieceType::Rook), rook_from, rook_to);
            }
            MoveKind::EnPassant => {
                self.move_piece(mv.piece, mv.from, mv.to);
                let cap_sq = if us == Color::White { mv.to - 8 } else { mv.to + 8 };
                self.remove_piece(Piece::new(us.flip(), PieceType::Pawn), cap_sq);
            }
        }

        if let Some(net) = &self.nnue {
            net.update_on_move(&mut self.accumulators, mv);
        }

        let old_rights = self.castling;
        let mut rights = self.castling;
        for s in [mv.from, mv.to] {
            match s {
                sq::E1 => {
                    rights.wk = false;
                    rights.wq = false;
                }
                sq::H1 => rights.wk = false,
                sq::A1 => rights.wq = false,
                sq::E8 => {
                    rights.bk = false;
                    rights.bq = false;
                }
                sq::H8 => rights.bk = false,
                sq::A8 => rights.bq = false,
                _ => {}
            }
        }
        if rights != old_rights {
            self.zobrist ^= old_rights.hash() ^ rights.hash();
            self.castling = rights;
        }

        if mv.piece.kind == PieceType::Pawn || mv.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.turn = self.turn.flip();
        self.zobrist ^= zobrist::side_key();
    }

    /// Restores the position to exactly the state before the last make.
    /// This is not a replay of an inverse move; castling, en-passant and
    /// promotion are unwound through their own paths and every snapshotted
    /// field is written back verbatim.
    pub fn undo(&mut self) {
        let Some(u) = self.history.pop() else {
            debug_assert!(false, "undo with empty history");
            return;
        };

        if let Some(mv) = u.mv {
            let us = mv.piece.color;
            match mv.kind {
                MoveKind::Quiet => self.move_piece(mv.piece, mv.to, mv.from),
                MoveKind::Capture => {
                    let captured = mv.captured.expect("capture move carries a victim");
                    self.move_piece(mv.piece, mv.to, mv.from);
                    self.put_piece(captured, mv.to);
                }
                MoveKind::Promotion => {
                    let promoted =
                        Piece::new(us, mv.promotion.expect("promotion move carries a piece"));
                    self.replace_piece(promoted, mv.piece, mv.to);
                    self.move_piece(mv.piece, mv.to, mv.from);
                }
                MoveKind::CapturePromotion => {
                    let captured = mv.captured.expect("capture move carries a victim");
                    let promoted =
                        Piece::new(us, mv.promotion.expect("promotion move carries a piece"));
                    self.replace_piece(promoted, mv.piece, mv.to);
                    self.move_piece(mv.piece, mv.to, mv.from);
                    self.put_piece(captured, mv.to);
                }
                MoveKind::KingCastle | MoveKind::QueenCastle => {
                    let (rook_from, rook_to) = Board::rook_castle_squares(us, mv.kind);
                    self.move_piece(mv.piece, mv.to, mv.from);
                    self.move_piece(Piece::new(us, PieceType::Rook), rook_to, rook_from);
                }
                MoveKind::EnPassant => {
                    self.move_piece(mv.piece, mv.to, mv.from);
                    let cap_sq = if us == Color::White { mv.to - 8 } else { mv.to + 8 };
                    self.put_piece(Piece::new(us.flip(), PieceType::Pawn), cap_sq);
                }
            }
            self.turn = us;
        } else {
            self.turn = self.turn.flip();
        }

        self.castling = u.castling;
        self.en_passant = u.en_passant;
        self.zobrist = u.zobrist;
        self.halfmove_clock = u.halfmove_clock;
        self.fullmove_number = u.fullmove_number;
        self.accumulators = u.accumulators;
    }

    /// Passes the turn without moving. Used by null-move pruning; unwound
    /// by the regular `undo`.
    pub fn make_null_move(&mut self) {
        self.history.push(Undo {
            mv: None,
            castling: self.castling,
            en_passant: self.en_passant,
            zobrist: self.zobrist,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            accumulators: self.accumulators,
        });
        if let Some(ep) = self.en_passant.take() {
            self.zobrist ^= zobrist::en_passant_key(ep);
        }
        self.halfmove_clock += 1;
        self.turn = self.turn.flip();
        self.zobrist ^= zobrist::side_key();
    }

    // Queries

    /// Whether `sq` is attacked by any piece of `by`, on the current
    /// occupancy.
    pub fn square_attacked(&self, sq: Square, by: Color) -> bool {
        if attacks::pawn_attacks(by.flip(), sq) & self.pieces_of(PieceType::Pawn, by) != 0 {
            return true;
        }
        if attacks::knight_attacks(sq) & self.pieces_of(PieceType::Knight, by) != 0 {
            return true;
        }
        if attacks::king_attacks(sq) & self.pieces_of(PieceType::King, by) != 0 {
            return true;
        }
        let diagonal =
            self.pieces_of(PieceType::Bishop, by) | self.pieces_of(PieceType::Queen, by);
        if attacks::bishop_attacks(sq, self.occupied) & diagonal != 0 {
            return true;
        }
        let orthogonal =
            self.pieces_of(PieceType::Rook, by) | self.pieces_of(PieceType::Queen, by);
        attacks::rook_attacks(sq, self.occupied) & orthogonal != 0
    }

    pub fn king_square(&self, color: Color) -> Square {
        bit_scan(self.pieces_of(PieceType::King, color))
    }

    pub fn is_check(&self, color: Color) -> bool {
        self.square_attacked(self.king_square(color), color.flip())
    }

    /// The current position occurred at least twice before in the history.
    pub fn is_threefold(&self) -> bool {
        self.history.iter().filter(|u| u.zobrist == self.zobrist).count() >= 2
    }

    /// Bare kings, or a lone minor piece against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.pieces_of(PieceType::Pawn, Color::White)
            | self.pieces_of(PieceType::Pawn, Color::Black)
            | self.pieces_of(PieceType::Rook, Color::White)
            | self.pieces_of(PieceType::Rook, Color::Black)
            | self.pieces_of(PieceType::Queen, Color::White)
            | self.pieces_of(PieceType::Queen, Color::Black);
        if heavy != 0 {
            return false;
        }
        let minors = self.pieces_of(PieceType::Knight, Color::White)
            | self.pieces_of(PieceType::Knight, Color::Black)
            | self.pieces_of(PieceType::Bishop, Color::White)
            | self.pieces_of(PieceType::Bishop, Color::Black);
        minors.count_ones() <= 1
    }

    /// Any non-pawn, non-king material for the side. Null-move guard.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        self.colors[color.index()]
            & !(self.pieces_of(PieceType::Pawn, color) | self.pieces_of(PieceType::King, color))
            != 0
    }

    /// Resolves a UCI move string against this position. Rejects the
    /// string before any board state changes: the move must parse and be
    /// in the legal move list.
    pub fn parse_move(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        let bytes = uci.as_bytes();
        let well_formed = (bytes.len() == 4 || bytes.len() == 5)
            && square_from_string(&uci[0..2]).is_some()
            && square_from_string(&uci[2..4]).is_some()
            && (bytes.len() == 4 || PieceType::from_char(bytes[4] as char).is_some());
        if !well_formed {
            return Err(MoveParseError::Malformed(uci.to_string()));
        }
        self.generate_legal_moves()
            .into_iter()
            .find(|m| m.to_uci() == uci)
            .ok_or_else(|| MoveParseError::Illegal(uci.to_string()))
    }

    pub fn make_move_uci(&mut self, uci: &str) -> Result<(), MoveParseError> {
        let mv = self.parse_move(uci)?;
        self.make_move(mv);
        Ok(())
    }

    /// Asserts every cross-representation invariant: piece masks are
    /// disjoint and agree with occupied/empty and the mailbox, and the
    /// incrementally maintained hash and accumulators equal a recompute.
    /// A violation is a defect in make/unmake or the generator and panics
    /// loudly; intended for tests and debug builds.
    pub fn assert_consistent(&self) {
        let mut occ = 0u64;
        let mut colors = [0u64; 2];
        for (i, &bb) in self.pieces.iter().enumerate() {
            assert_eq!(occ & bb, 0, "piece masks overlap at index {i}");
            occ |= bb;
            colors[i / 6] |= bb;
        }
        assert_eq!(occ, self.occupied, "occupied mask out of sync");
        assert_eq!(!occ, self.empty, "empty mask out of sync");
        assert_eq!(colors, self.colors, "color masks out of sync");
        for s in 0..64 {
            let bb = square_bb(s);
            match self.squares[s] {
                Some(p) => assert_ne!(
                    self.pieces[p.index()] & bb,
                    0,
                    "mailbox claims {p:?} on {} but the mask disagrees",
                    square_to_string(s)
                ),
                None => assert_eq!(
                    occ & bb,
                    0,
                    "mailbox empty on {} but occupied mask set",
                    square_to_string(s)
                ),
            }
        }
        assert_eq!(self.zobrist, zobrist::compute(self), "incremental hash out of sync");
        if let Some(net) = &self.nnue {
            assert_eq!(
                net.recompute(self),
                self.accumulators,
                "incremental accumulators out of sync"
            );
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = self.squares[rank * 8 + file].map_or('.', Piece::to_char);
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "fen: {}", self.to_fen())
    }
}
