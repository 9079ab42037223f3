//! ## Top-k counters
//! Weighted counters kept next to the sample when top-k tracking is enabled.
//!
//! Every successful coin flip at round `k` adds `2^k` to the item's weight, so weights
//! approximate frequencies scaled back up by the sampling probability. Items dropped by
//! a failed flip keep their weight; items dropped by truncation lose it and start again
//! from zero if they are sampled later. Rankings are therefore best effort only.
//!
//! Ties are broken by the order in which items first received a counter.

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counter {
    weight: u64,
    seq: u64,
}

impl Counter {
    /// Sort key: heavier first, then older first. Unique because `seq` is.
    #[inline]
    fn rank(&self) -> (Reverse<u64>, u64) {
        (Reverse(self.weight), self.seq)
    }
}

pub(crate) struct TopCounters<T, H: Hasher + Default> {
    counters: HashMap<T, Counter, BuildHasherDefault<H>>,
    /// Sequence number handed to the next new counter
    next_seq: u64,
}

impl<T: Hash + Eq, H: Hasher + Default> TopCounters<T, H> {
    pub(crate) fn new() -> Self {
        Self {
            counters: HashMap::default(),
            next_seq: 0,
        }
    }

    /// Add `weight` to `item`, creating its counter if absent
    #[inline]
    pub(crate) fn add(&mut self, item: T, weight: u64) {
        match self.counters.entry(item) {
            Entry::Occupied(mut entry) => {
                let counter = entry.get_mut();
                counter.weight = counter.weight.saturating_add(weight);
            }
            Entry::Vacant(entry) => {
                entry.insert(Counter {
                    weight,
                    seq: self.next_seq,
                });
                self.next_seq += 1;
            }
        }
    }

    /// Keep only the `n` highest-weight counters
    pub(crate) fn truncate(&mut self, n: usize) {
        if self.counters.len() <= n {
            return;
        }
        if n == 0 {
            self.counters.clear();
            return;
        }
        let mut ranks: Vec<_> = self.counters.values().map(Counter::rank).collect();
        let (_, &mut cutoff, _) = ranks.select_nth_unstable(n - 1);
        self.counters.retain(|_, counter| counter.rank() <= cutoff);
    }

    /// Return up to `k` items ordered by descending weight
    pub(crate) fn top(&self, k: usize) -> Vec<(&T, u64)> {
        let mut ranked: Vec<_> = self.counters.iter().collect();
        ranked.sort_unstable_by_key(|(_, counter)| counter.rank());
        ranked.truncate(k);
        ranked
            .into_iter()
            .map(|(item, counter)| (item, counter.weight))
            .collect()
    }

    /// Return accumulated weight of `item`, if it has a counter
    #[cfg(test)]
    pub(crate) fn weight(&self, item: &T) -> Option<u64> {
        self.counters.get(item).map(|counter| counter.weight)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.counters.len()
    }

    /// Return approximate heap size of the counters
    pub(crate) fn size_of(&self) -> usize {
        self.counters.capacity() * (size_of::<T>() + size_of::<Counter>())
    }
}
