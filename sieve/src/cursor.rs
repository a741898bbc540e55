//! The coordinator's position among the primes it owns.

use crate::partition::FIRST_ODD_PRIME;
use crate::store::LocalStore;

/// The current sieving prime and its storage index in worker zero's store.
///
/// Worker zero's range starts at 3, so the entry at index `i` represents `3 + 2i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeCursor {
    index: usize,
    prime: u64,
}

impl Default for PrimeCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimeCursor {
    /// A cursor on 3, at index 0.
    pub fn new() -> Self {
        PrimeCursor { index: 0, prime: FIRST_ODD_PRIME }
    }

    /// Storage index of the current prime.
    pub fn index(&self) -> usize { self.index }
    /// The current prime.
    pub fn prime(&self) -> u64 { self.prime }

    /// Storage index of the first multiple of the current prime worth marking.
    ///
    /// This is the prime's odd multiple `3p`, `prime` entries past the prime itself.
    pub fn first_index(&self) -> usize {
        self.index.saturating_add(usize::try_from(self.prime).unwrap_or(usize::MAX))
    }

    /// Moves to the next unmarked entry of `store` and returns the value it represents.
    ///
    /// If the store holds no further unmarked entry the cursor lands one past the end, on a
    /// value whose square exceeds any bound the store was sized for.
    pub fn advance(&mut self, store: &LocalStore) -> u64 {
        self.index = store.next_unmarked_after(self.index);
        self.prime = FIRST_ODD_PRIME + 2 * self.index as u64;
        self.prime
    }
}
