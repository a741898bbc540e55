//! Per-worker marking storage.

use crate::error::SieveError;
use crate::partition::{offset_to_index, SieveRange};

/// One flag per owned odd integer, set once the integer is known to be composite.
///
/// Flags only ever go from unmarked to marked, so striking out the same multiple twice is
/// harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStore {
    marked: Vec<bool>,
}

impl LocalStore {
    /// Allocates `size` unmarked entries for worker `index`.
    ///
    /// Reports a `Resource` error rather than aborting if the memory is not available.
    pub fn allocate(size: usize, index: usize) -> Result<Self, SieveError> {
        let mut marked = Vec::new();
        marked
            .try_reserve_exact(size)
            .map_err(|_| SieveError::Resource { index, size })?;
        marked.resize(size, false);
        Ok(LocalStore { marked })
    }

    /// Number of entries.
    pub fn len(&self) -> usize { self.marked.len() }
    /// True if the store has no entries.
    pub fn is_empty(&self) -> bool { self.marked.is_empty() }

    /// True if the entry at `index` has been struck out.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than `len()`.
    pub fn is_marked(&self, index: usize) -> bool {
        self.marked[index]
    }

    /// Marks every `prime`-th entry starting at `first`, and returns how many entries it visited.
    ///
    /// Consecutive entries are two apart in value, so a stride of `prime` entries steps over
    /// the even multiples of `prime`. A `first` at or past the end marks nothing.
    pub fn mark_multiples(&mut self, first: usize, prime: u64) -> usize {
        let stride = usize::try_from(prime).unwrap_or(usize::MAX);
        let mut visited = 0;
        for flag in self.marked.iter_mut().skip(first).step_by(stride) {
            *flag = true;
            visited += 1;
        }
        visited
    }

    /// The first unmarked entry after `index`, or `len()` if there is none.
    pub fn next_unmarked_after(&self, index: usize) -> usize {
        self.marked
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, marked)| !**marked)
            .map(|(position, _)| position)
            .unwrap_or(self.marked.len())
    }

    /// Number of entries never struck out.
    pub fn count_unmarked(&self) -> u64 {
        self.marked.iter().filter(|marked| !**marked).count() as u64
    }
}

/// Storage index of the first odd multiple of `prime` in `range`.
///
/// The result may be past the end of the range's storage, in which case there is nothing to
/// mark.
pub fn first_index(range: &SieveRange, prime: u64) -> usize {
    offset_to_index(range.first_multiple_offset(prime))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked_values(range: &SieveRange, store: &LocalStore) -> Vec<u64> {
        (0 .. store.len()).filter(|&index| store.is_marked(index)).map(|index| range.value_at(index)).collect()
    }

    #[test]
    fn marks_odd_multiples_only() {
        let range = SieveRange { low_value: 27, high_value: 49 };
        let mut store = LocalStore::allocate(range.size(), 1).unwrap();
        assert_eq!(store.len(), 12);

        let visited = store.mark_multiples(first_index(&range, 3), 3);
        assert_eq!(visited, 4);
        assert_eq!(marked_values(&range, &store), vec![27, 33, 39, 45]);

        store.mark_multiples(first_index(&range, 5), 5);
        store.mark_multiples(first_index(&range, 7), 7);
        assert_eq!(marked_values(&range, &store), vec![27, 33, 35, 39, 45, 49]);
        assert_eq!(store.count_unmarked(), 6);
    }

    #[test]
    fn marking_twice_changes_nothing() {
        let range = SieveRange { low_value: 51, high_value: 75 };
        let mut store = LocalStore::allocate(range.size(), 2).unwrap();
        store.mark_multiples(first_index(&range, 5), 5);
        let once = store.clone();
        store.mark_multiples(first_index(&range, 5), 5);
        assert_eq!(store, once);
    }

    #[test]
    fn first_index_past_the_end_marks_nothing() {
        let range = SieveRange { low_value: 3, high_value: 5 };
        let mut store = LocalStore::allocate(range.size(), 0).unwrap();
        assert_eq!(store.mark_multiples(5, 3), 0);
        assert_eq!(store.count_unmarked(), 2);
    }

    #[test]
    fn next_unmarked_skips_marks() {
        let mut store = LocalStore::allocate(6, 0).unwrap();
        store.mark_multiples(1, 2);
        assert_eq!(store.next_unmarked_after(0), 2);
        assert_eq!(store.next_unmarked_after(3), 4);
        assert_eq!(store.next_unmarked_after(4), 6);
        assert_eq!(store.next_unmarked_after(10), 6);
    }

    #[test]
    #[should_panic]
    fn is_marked_past_the_end_panics() {
        let store = LocalStore::allocate(3, 0).unwrap();
        store.is_marked(3);
    }

    #[test]
    fn oversized_allocation_is_reported() {
        let error = LocalStore::allocate(usize::MAX, 3).unwrap_err();
        assert_eq!(error, SieveError::Resource { index: 3, size: usize::MAX });
    }

    #[test]
    fn empty_store_counts_nothing() {
        let store = LocalStore::allocate(0, 0).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.count_unmarked(), 0);
        assert_eq!(store.next_unmarked_after(0), 0);
    }
}
