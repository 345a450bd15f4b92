//! Small in-memory opening book: a handful of repertoire lines flattened
//! into a map from position hash to candidate replies. A probe miss just
//! means "no suggestion".

use std::collections::HashMap;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::Board;

#[derive(Debug, Clone)]
pub struct BookEntry {
    pub mv: String,
    pub variation: String,
}

pub struct OpeningBook {
    positions: HashMap<u64, Vec<BookEntry>>,
}

const LINES: &[(&[&str], &str)] = &[
    (&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6", "e1g1", "f8e7"], "Ruy Lopez"),
    (&["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "c2c3", "d7d6", "d2d3"], "Giuoco Piano"),
    (&["e2e4", "c7c5", "g1f3", "b8c6", "f1b5", "g8f6", "b5c6", "d7c6", "d2d3", "c8g4"], "Sicilian Rossolimo"),
    (&["e2e4", "c7c5", "g1f3", "d7d6", "f1b5"], "Sicilian Canal"),
    (&["e2e4", "c7c5", "g1f3", "b8c6", "d2d4", "c5d4", "f3d4", "g8f6", "d4c6", "b7c6"], "Open Sicilian"),
    (&["e2e4", "c7c5", "g1f3", "b8c6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "e7e6"], "Sicilian Four Knights"),
    (&["d2d4", "d7d5", "c2c4", "e7e6", "g1f3", "g8f6", "b1c3", "f8e7"], "Queen's Gambit Declined"),
    (&["d2d4", "d7d5", "c2c4", "e7e6", "b1c3", "g8f6", "c1g5", "f8e7"], "Queen's Gambit Declined"),
    (&["d2d4", "d7d5", "c2c4", "d5c4", "g1f3", "g8f6", "e2e3", "b7b5", "a2a4", "c7c6", "a4b5", "c6b5", "b2b3"], "Queen's Gambit Accepted"),
    (&["d2d4", "g8f6", "c2c4", "e7e6", "b1c3", "f8b4"], "Nimzo-Indian"),
    (&["d2d4", "g8f6", "c2c4", "e7e6", "g1f3", "d7d5"], "Queen's Gambit Declined"),
    (&["c2c4", "e7e6", "d2d4", "g8f6", "g1f3", "d7d5"], "English"),
];

impl OpeningBook {
    /// Replays every line from the starting position, recording the hash
    /// of each position passed through together with the book reply.
    pub fn new() -> OpeningBook {
        let mut positions: HashMap<u64, Vec<BookEntry>> = HashMap::new();
        for (line, variation) in LINES {
            let mut board = Board::start_pos();
            for mv in *line {
                let entries = positions.entry(board.zobrist()).or_default();
                if !entries.iter().any(|e| e.mv == *mv) {
                    entries.push(BookEntry { mv: (*mv).to_string(), variation: (*variation).to_string() });
                }
                if board.make_move_uci(mv).is_err() {
                    debug_assert!(false, "book line contains an illegal move: {mv}");
                    break;
                }
            }
        }
        OpeningBook { positions }
    }

    /// A random book reply for the position hash, if any line covers it.
    pub fn probe<R: Rng>(&self, zobrist: u64, rng: &mut R) -> Option<&BookEntry> {
        let entry = self.positions.get(&zobrist)?.choose(rng);
        if let Some(e) = entry {
            debug!("book hit: {} ({})", e.mv, e.variation);
        }
        entry
    }
}

impl Default for OpeningBook {
    fn default() -> OpeningBook {
        OpeningBook::new()
    }
}
