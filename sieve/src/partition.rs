//! Block decomposition of the odd integers of `[3, n]` across workers.
//!
//! The `n - 1` integers of `[2, n]` are split into contiguous blocks, one per worker, and each
//! worker keeps only the odd integers of its block. Worker zero's block is pinned to start at
//! 3, so the number 2 is never represented and is added back when the count is reported.
//!
//! Three conversions relate values and storage: [`SieveRange::first_multiple_offset`] turns a
//! prime into the distance from `low_value` to its first odd multiple in the range,
//! [`offset_to_index`] turns such a distance into a storage index, and
//! [`SieveRange::value_at`] turns a storage index back into the value it represents.

use crate::error::SieveError;

/// The smallest odd prime, the first value worker zero represents.
pub const FIRST_ODD_PRIME: u64 = 3;

/// Inclusive bounds of the odd integers one worker owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SieveRange {
    /// The smallest odd integer owned.
    pub low_value: u64,
    /// The largest odd integer owned; below `low_value` when nothing is owned.
    pub high_value: u64,
}

impl SieveRange {
    /// The range owned by worker `index` of `peers` when sieving up to `n`.
    pub fn for_worker(n: u64, peers: usize, index: usize) -> Self {
        let low_value = if index == 0 {
            FIRST_ODD_PRIME
        } else {
            round_up_to_odd(block_low(n, peers, index))
        };
        let high_value = round_down_to_odd(block_high(n, peers, index));
        SieveRange { low_value, high_value }
    }

    /// Number of storage entries, one per owned odd integer.
    pub fn size(&self) -> usize {
        if self.high_value < self.low_value {
            0
        } else {
            usize::try_from((self.high_value - self.low_value) / 2 + 1).unwrap_or(usize::MAX)
        }
    }

    /// True when the range owns no integers at all.
    pub fn is_empty(&self) -> bool {
        self.high_value < self.low_value
    }

    /// True if `value` is an odd integer owned by this range.
    pub fn contains(&self, value: u64) -> bool {
        value % 2 == 1 && self.low_value <= value && value <= self.high_value
    }

    /// Distance from `low_value` to the first odd multiple of `prime` at or above it.
    ///
    /// The distance to the first multiple is `low_value mod prime` subtracted from `prime`
    /// (or zero). If that multiple is even it is never stored, so one more `prime` is added
    /// to land on the next, odd, multiple.
    pub fn first_multiple_offset(&self, prime: u64) -> u64 {
        let mut offset = self.low_value % prime;
        if offset != 0 {
            offset = prime - offset;
        }
        if (self.low_value + offset) % 2 == 0 {
            offset += prime;
        }
        offset
    }

    /// The odd integer stored at `index`.
    pub fn value_at(&self, index: usize) -> u64 {
        self.low_value + 2 * index as u64
    }
}

/// Storage index of the value `offset` integers above `low_value`.
pub fn offset_to_index(offset: u64) -> usize {
    usize::try_from(offset / 2).unwrap_or(usize::MAX)
}

/// First integer of worker `index`'s block.
pub fn block_low(n: u64, peers: usize, index: usize) -> u64 {
    2 + scaled(n, peers, index)
}

/// Last integer of worker `index`'s block.
pub fn block_high(n: u64, peers: usize, index: usize) -> u64 {
    1 + scaled(n, peers, index + 1)
}

/// `⌊index · (n - 1) / peers⌋`, without overflow.
fn scaled(n: u64, peers: usize, index: usize) -> u64 {
    ((index as u128 * (n - 1) as u128) / peers as u128) as u64
}

fn round_up_to_odd(value: u64) -> u64 {
    value | 1
}

fn round_down_to_odd(value: u64) -> u64 {
    if value % 2 == 0 { value.saturating_sub(1) } else { value }
}

/// Number of integers in worker zero's block, not counting the pinned-out 2.
pub fn proc0_size(n: u64, peers: usize) -> u64 {
    (n - 1) / peers as u64
}

/// Checks that worker zero owns every prime needed to sieve up to `n`.
///
/// Worker zero's block ends at `1 + proc0_size`, and all primes used for sieving are at most
/// `⌊√n⌋`. The block must reach `⌊√n⌋ - 1`, and its last odd integer must be within two of
/// `⌊√n⌋`, so that the cursor runs off the end only on a value whose square exceeds `n`.
/// Every worker evaluates this check on the same inputs and reaches the same answer.
pub fn check_feasible(n: u64, peers: usize) -> Result<(), SieveError> {
    let root = n.isqrt();
    let reach = 1 + proc0_size(n, peers);
    if reach + 1 < root || round_down_to_odd(reach) + 2 <= root {
        Err(SieveError::Configuration { n, peers })
    } else {
        Ok(())
    }
}

/// True while `prime` still has multiples to strike out below `n`.
pub fn needs_sieving(prime: u64, n: u64) -> bool {
    (prime as u128) * (prime as u128) <= n as u128
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn feasible(n: u64, peers: usize) -> bool {
        check_feasible(n, peers).is_ok()
    }

    #[test]
    fn four_ways_up_to_one_hundred() {
        let ranges = (0 .. 4).map(|index| SieveRange::for_worker(100, 4, index)).collect::<Vec<_>>();
        assert_eq!(ranges[0], SieveRange { low_value: 3, high_value: 25 });
        assert_eq!(ranges[1], SieveRange { low_value: 27, high_value: 49 });
        assert_eq!(ranges[2], SieveRange { low_value: 51, high_value: 75 });
        assert_eq!(ranges[3], SieveRange { low_value: 77, high_value: 99 });
        assert_eq!(ranges.iter().map(SieveRange::size).collect::<Vec<_>>(), vec![12, 12, 13, 12]);
    }

    #[test]
    fn ranges_own_every_odd_integer_once() {
        for n in 2 .. 400 {
            for peers in 1 .. 12 {
                if !feasible(n, peers) { continue; }
                let ranges = (0 .. peers).map(|index| SieveRange::for_worker(n, peers, index)).collect::<Vec<_>>();
                let owned = ranges
                    .iter()
                    .flat_map(|range| (0 .. range.size()).map(move |index| range.value_at(index)))
                    .collect::<Vec<_>>();
                let expected = (3 ..= n).step_by(2).collect::<Vec<_>>();
                assert_eq!(owned, expected, "n = {}, peers = {}", n, peers);

                for (prev, next) in ranges.iter().filter(|range| !range.is_empty()).tuple_windows() {
                    assert_eq!(prev.high_value + 2, next.low_value, "n = {}, peers = {}", n, peers);
                }
                assert_eq!(ranges[0].low_value, 3);
                for range in ranges.iter() {
                    assert_eq!(range.low_value % 2, 1);
                    assert!(!range.contains(range.low_value + 1));
                }
            }
        }
    }

    #[test]
    fn tiny_bounds_leave_ranges_empty() {
        let range = SieveRange::for_worker(2, 1, 0);
        assert!(range.is_empty());
        assert_eq!(range.size(), 0);

        let sizes = (0 .. 4).map(|index| SieveRange::for_worker(3, 4, index).size()).collect::<Vec<_>>();
        assert_eq!(sizes, vec![0, 0, 0, 1]);
    }

    #[test]
    fn feasibility_follows_the_square_root() {
        assert!(feasible(100, 4));
        assert!(feasible(100, 11));
        // worker zero owns 3 ..= 9, and 11 is past the square root.
        assert!(feasible(100, 12));
        assert!(!feasible(100, 13));
        assert!(!feasible(100, 20));
        assert!(feasible(120, 14));
        // 7 must be owned by worker zero to strike out 49.
        assert!(feasible(49, 8));
        assert!(!feasible(49, 9));
        // worker zero would stop at 7, leaving the cursor on 9.
        assert!(!feasible(81, 11));
        assert!(feasible(2, 64));
        assert!(feasible(8, 64));
        assert_eq!(check_feasible(100, 20), Err(SieveError::Configuration { n: 100, peers: 20 }));
    }

    #[test]
    fn feasible_coordinators_own_every_sieving_prime() {
        for n in 2 .. 2_000u64 {
            for peers in 1 .. 40 {
                let range = SieveRange::for_worker(n, peers, 0);
                let root = n.isqrt();
                let owns_all = (3 ..= root).step_by(2).all(|value| range.contains(value));
                let exhausted = range.high_value + 2;
                assert_eq!(
                    feasible(n, peers),
                    block_high(n, peers, 0) + 1 >= root && owns_all && !needs_sieving(exhausted, n),
                    "n = {}, peers = {}", n, peers,
                );
            }
        }
    }

    #[test]
    fn first_multiple_skips_even_multiples() {
        let range = SieveRange { low_value: 27, high_value: 49 };
        // 27 itself.
        assert_eq!(range.first_multiple_offset(3), 0);
        // 30 is even, so 35.
        assert_eq!(range.first_multiple_offset(5), 8);
        // 28 is even, so 35.
        assert_eq!(range.first_multiple_offset(7), 8);
        assert_eq!(range.value_at(offset_to_index(range.first_multiple_offset(7))), 35);

        let range = SieveRange { low_value: 51, high_value: 75 };
        assert_eq!(range.value_at(offset_to_index(range.first_multiple_offset(7))), 63);
        assert_eq!(range.value_at(offset_to_index(range.first_multiple_offset(3))), 51);
        assert_eq!(range.value_at(offset_to_index(range.first_multiple_offset(5))), 55);
    }

    #[test]
    fn first_multiple_is_odd_and_owned_or_past_the_end() {
        for low_value in (5 .. 301).step_by(2) {
            let range = SieveRange { low_value, high_value: low_value + 200 };
            for prime in [3u64, 5, 7, 11, 13] {
                let value = range.value_at(offset_to_index(range.first_multiple_offset(prime)));
                assert_eq!(value % prime, 0);
                assert_eq!(value % 2, 1);
                assert!(value >= low_value && value < low_value + 2 * prime);
            }
        }
    }

    #[test]
    fn sieving_stops_past_the_square_root() {
        assert!(needs_sieving(3, 9));
        assert!(!needs_sieving(3, 8));
        assert!(needs_sieving(5, 25));
        assert!(!needs_sieving(u64::MAX, u64::MAX));
    }
}
