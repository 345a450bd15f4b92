//! Precomputed attack tables: leaper lookups, magic-indexed slider
//! tables, and the between/line tables used for pin and check masks.
//!
//! Everything here is immutable process-wide state built once before any
//! search. Magic constants are found at startup by seeded random trial
//! against a reference ray-cast, so every table slot is correct by
//! construction; the ray-cast itself is never used after init.

use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::bitboard::{shift, square_bb, Bitboard, Direction};
use super::{Color, Square};

const ROOK_DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DELTAS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const MAGIC_SEED: u64 = 0x5eed_1234_cafe_f00d;

struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    attacks: Vec<Bitboard>,
}

impl Magic {
    #[inline]
    fn lookup(&self, occupied: Bitboard) -> Bitboard {
        let idx = ((occupied & self.mask).wrapping_mul(self.magic) >> self.shift) as usize;
        self.attacks[idx]
    }
}

pub struct AttackTables {
    king: [Bitboard; 64],
    knight: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    rook: [Magic; 64],
    bishop: [Magic; 64],
    between: Box<[[Bitboard; 64]; 64]>,
    line: Box<[[Bitboard; 64]; 64]>,
}

static TABLES: OnceLock<AttackTables> = OnceLock::new();

fn tables() -> &'static AttackTables {
    TABLES.get_or_init(AttackTables::build)
}

/// Forces table construction. Called once at process startup so the first
/// search does not pay the magic-search cost.
pub fn init() {
    let _ = tables();
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables().king[sq]
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().knight[sq]
}

#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    tables().pawn[color.index()][sq]
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().rook[sq].lookup(occupied)
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().bishop[sq].lookup(occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Squares strictly between two aligned squares; empty if not aligned.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables().between[a][b]
}

/// The full line (both rays plus endpoints) through two aligned squares;
/// empty if not aligned.
#[inline]
pub fn line(a: Square, b: Square) -> Bitboard {
    tables().line[a][b]
}

/// Attack squares of every pawn in the mask at once.
#[inline]
pub fn all_pawn_attacks(pawns: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => shift(pawns, Direction::NorthEast) | shift(pawns, Direction::NorthWest),
        Color::Black => shift(pawns, Direction::SouthEast) | shift(pawns, Direction::SouthWest),
    }
}

impl AttackTables {
    fn build() -> AttackTables {
        let mut rng = SmallRng::seed_from_u64(MAGIC_SEED);

        let mut king = [0u64; 64];
        let mut knight = [0u64; 64];
        let mut pawn = [[0u64; 64]; 2];
        for sq in 0..64 {
            let bb = square_bb(sq);
            let mut ring = shift(bb, Direction::East) | shift(bb, Direction::West);
            let column = bb | ring;
            ring |= shift(column, Direction::North) | shift(column, Direction::South);
            king[sq] = ring;

            let mut n = 0u64;
            for (dr, dc) in [(2, 1), (2, -1), (-2, 1), (-2, -1), (1, 2), (1, -2), (-1, 2), (-1, -2)] {
                if let Some(to) = offset_square(sq, dr, dc) {
                    n |= square_bb(to);
                }
            }
            knight[sq] = n;

            pawn[Color::White.index()][sq] =
                shift(bb, Direction::NorthEast) | shift(bb, Direction::NorthWest);
            pawn[Color::Black.index()][sq] =
                shift(bb, Direction::SouthEast) | shift(bb, Direction::SouthWest);
        }

        let rook = std::array::from_fn(|sq| find_magic(&mut rng, sq, &ROOK_DELTAS));
        let bishop = std::array::from_fn(|sq| find_magic(&mut rng, sq, &BISHOP_DELTAS));

        let mut between = Box::new([[0u64; 64]; 64]);
        let mut line = Box::new([[0u64; 64]; 64]);
        for a in 0..64 {
            for b in 0..64 {
                if a == b {
                    continue;
                }
                let endpoints = square_bb(a) | square_bb(b);
                if ray_attacks(a, 0, &BISHOP_DELTAS) & square_bb(b) != 0 {
                    between[a][b] =
                        ray_attacks(a, square_bb(b), &BISHOP_DELTAS) & ray_attacks(b, square_bb(a), &BISHOP_DELTAS);
                    line[a][b] =
                        (ray_attacks(a, 0, &BISHOP_DELTAS) & ray_attacks(b, 0, &BISHOP_DELTAS)) | endpoints;
                } else if ray_attacks(a, 0, &ROOK_DELTAS) & square_bb(b) != 0 {
                    between[a][b] =
                        ray_attacks(a, square_bb(b), &ROOK_DELTAS) & ray_attacks(b, square_bb(a), &ROOK_DELTAS);
                    line[a][b] =
                        (ray_attacks(a, 0, &ROOK_DELTAS) & ray_attacks(b, 0, &ROOK_DELTAS)) | endpoints;
                }
            }
        }

        AttackTables { king, knight, pawn, rook, bishop, between, line }
    }
}

fn offset_square(sq: Square, dr: i32, dc: i32) -> Option<Square> {
    let r = (sq / 8) as i32 + dr;
    let c = (sq % 8) as i32 + dc;
    if (0..8).contains(&r) && (0..8).contains(&c) {
        Some((r * 8 + c) as Square)
    } else {
        None
    }
}

/// Reference ray-cast: walk each direction until the edge or the first
/// blocker (which is included in the attack set). Init-time only.
pub fn ray_attacks(sq: Square, occupied: Bitboard, deltas: &[(i32, i32); 4]) -> Bitboard {
    let mut attacks = 0u64;
    for &(dr, dc) in deltas {
        let (mut r, mut c) = ((sq / 8) as i32 + dr, (sq % 8) as i32 + dc);
        while (0..8).contains(&r) && (0..8).contains(&c) {
            let bb = square_bb((r * 8 + c) as Square);
            attacks |= bb;
            if occupied & bb != 0 {
                break;
            }
            r += dr;
            c += dc;
        }
    }
    attacks
}

/// Relevant-occupancy mask: every square a blocker on could change the
/// attack set, which excludes the edge square terminating each ray.
pub fn relevant_mask(sq: Square, deltas: &[(i32, i32); 4]) -> Bitboard {
    let mut mask = 0u64;
    for &(dr, dc) in deltas {
        let (mut r, mut c) = ((sq / 8) as i32 + dr, (sq % 8) as i32 + dc);
        while (0..8).contains(&(r + dr)) && (0..8).contains(&(c + dc)) {
            mask |= square_bb((r * 8 + c) as Square);
            r += dr;
            c += dc;
        }
    }
    mask
}

/// Every subset of the mask via carry-ripple enumeration, paired with the
/// reference attack set for that exact occupancy.
fn enumerate_subsets(sq: Square, mask: Bitboard, deltas: &[(i32, i32); 4]) -> Vec<(Bitboard, Bitboard)> {
    let mut out = Vec::with_capacity(1 << mask.count_ones());
    let mut subset: Bitboard = 0;
    loop {
        out.push((subset, ray_attacks(sq, subset, deltas)));
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    out
}

fn find_magic(rng: &mut SmallRng, sq: Square, deltas: &[(i32, i32); 4]) -> Magic {
    let mask = relevant_mask(sq, deltas);
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let size = 1usize << bits;
    let subsets = enumerate_subsets(sq, mask, deltas);

    'candidate: loop {
        // Sparse candidates converge much faster than uniform ones.
        let magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }
        let mut attacks = vec![0u64; size];
        let mut used = vec![false; size];
        for &(occ, att) in &subsets {
            let idx = (occ.wrapping_mul(magic) >> shift) as usize;
            if used[idx] && attacks[idx] != att {
                continue 'candidate;
            }
            attacks[idx] = att;
            used[idx] = true;
        }
        return Magic { mask, magic, shift, attacks };
    }
}
