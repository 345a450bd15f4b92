//! Fixed-capacity transposition table. Slot = hash modulo capacity,
//! always-replace on store, no chaining. Probing compares the stored hash
//! so an index collision reads as a miss, and a fresh table (all empty
//! slots) behaves the same way.

use crate::board::Move;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub key: u64,
    pub best: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub bound: Bound,
}

pub struct Tt {
    entries: Vec<Option<TtEntry>>,
    mask: u64,
}

pub const DEFAULT_TT_MB: usize = 64;

impl Tt {
    /// Capacity is rounded down to a power of two so indexing is a mask.
    pub fn with_capacity_mb(megabytes: usize) -> Tt {
        let bytes = megabytes.max(1) * 1024 * 1024;
        let want = bytes / std::mem::size_of::<Option<TtEntry>>();
        let count = if want.is_power_of_two() { want } else { want.next_power_of_two() / 2 };
        let count = count.max(1);
        Tt { entries: vec![None; count], mask: (count - 1) as u64 }
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        self.entries[(key & self.mask) as usize].filter(|e| e.key == key)
    }

    #[inline]
    pub fn store(&mut self, entry: TtEntry) {
        self.entries[(entry.key & self.mask) as usize] = Some(entry);
    }
}

impl Default for Tt {
    fn default() -> Tt {
        Tt::with_capacity_mb(DEFAULT_TT_MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_misses() {
        let tt = Tt::with_capacity_mb(1);
        assert!(tt.probe(0).is_none());
        assert!(tt.probe(0xdead_beef).is_none());
    }

    #[test]
    fn store_probe_roundtrip_and_collision_detection() {
        let mut tt = Tt::with_capacity_mb(1);
        let e = TtEntry { key: 42, best: None, score: 17, depth: 3, bound: Bound::Exact };
        tt.store(e);
        assert_eq!(tt.probe(42).map(|e| e.score), Some(17));
        // Same slot, different hash: must read as a miss.
        let colliding = 42 + tt.capacity() as u64;
        assert!(tt.probe(colliding).is_none());
        // Always-replace: the colliding write wins the slot.
        tt.store(TtEntry { key: colliding, best: None, score: -5, depth: 1, bound: Bound::Lower });
        assert!(tt.probe(42).is_none());
        assert_eq!(tt.probe(colliding).map(|e| e.score), Some(-5));
    }
}
