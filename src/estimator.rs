//! Cardinality estimator allows to estimate number of distinct elements
//! in the stream or dataset with memory bounded by a fixed sample `capacity`,
//! derived from `epsilon` and `delta` (see [`Config`]).
//!
//! # Algorithm
//!
//! The estimator keeps a set of sampled items and a `round` counter:
//! - At round `k` every observed item is kept with probability `1 / 2^k`
//!   (see [`crate::coin`]). An item that loses its coin flip is removed
//!   from the sample, so its membership reflects its latest observation only.
//! - Whenever the sample reaches `capacity`, `round` is incremented and every
//!   retained item flips a fresh fair coin to stay. This halves the sample and
//!   is equivalent to having sampled with probability `1 / 2^(k + 1)` from the start.
//! - The estimate is `|sample| * 2^round`.
//!
//! Round 0 keeps every item, so the estimate is exact until the number of
//! distinct items reaches `capacity`.
//!
//! The sample is thinned again for as long as it stays full, so it always holds
//! fewer than `capacity` items once `observe` returns. Very small capacities
//! degenerate: with capacity 1 every observation ends with an empty sample and an
//! estimate of 0, and with capacity 2 a single call often advances several rounds.
//! Use `max_items` of at least a few dozen for meaningful estimates.
//!
//! # Accuracy
//! With capacity derived from `epsilon` and `delta`, the relative error of the
//! estimate is at most `epsilon` with probability at least `1 - delta`.
//!
//! # Memory
//! The sample never holds more than `capacity` items. Top-k counters are truncated
//! to `capacity` entries on every round advance and never exceed `2 * capacity`.
//!
//! # Top-k
//! With `track_top_k > 0` every successful coin flip at round `k` adds `2^k`
//! to the item's weight. Weights are a best-effort frequency ranking, not exact
//! counts: an item truncated away after a round advance starts over from zero.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;
use wyhash::WyHash;

use crate::coin::{fair_bit, CoinTrait};
use crate::config::Config;
use crate::error::ConfigurationError;
use crate::top_k::TopCounters;

/// Streaming distinct-element estimator over items of type `T`.
///
/// `R` is the random source used for coin flips and `H` the hasher used for
/// the sample set and top-k counters.
pub struct CardinalityEstimator<T, R = StdRng, H = WyHash>
where
    T: Hash + Eq,
    R: RngCore,
    H: Hasher + Default,
{
    config: Config,
    /// Maximum number of items retained in `sample`
    capacity: usize,
    /// Current sampling round, items are kept with probability `1 / 2^round`
    round: u32,
    /// Number of `observe` calls
    total_seen: u64,
    /// Currently sampled distinct items
    sample: HashSet<T, BuildHasherDefault<H>>,
    /// Present only when top-k tracking is enabled
    top_counters: Option<TopCounters<T, H>>,
    rng: R,
}

impl<T: Hash + Eq> CardinalityEstimator<T> {
    /// Creates new instance of `CardinalityEstimator` seeded from OS entropy
    pub fn new(config: Config) -> Result<Self, ConfigurationError> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<T: Hash + Eq, R: RngCore> CardinalityEstimator<T, R> {
    /// Creates new instance of `CardinalityEstimator` drawing coin flips from `rng`
    pub fn with_rng(config: Config, rng: R) -> Result<Self, ConfigurationError> {
        Self::with_rng_and_hasher(config, rng)
    }
}

impl<T, R, H> CardinalityEstimator<T, R, H>
where
    T: Hash + Eq,
    R: RngCore,
    H: Hasher + Default,
{
    /// Creates new instance of `CardinalityEstimator` with custom random source and hasher
    pub fn with_rng_and_hasher(config: Config, rng: R) -> Result<Self, ConfigurationError> {
        let capacity = config.capacity()?;
        debug!(
            capacity,
            max_items = config.max_items,
            epsilon = config.epsilon,
            delta = config.delta,
            track_top_k = config.track_top_k,
            "created cardinality estimator"
        );

        Ok(Self {
            config,
            capacity,
            round: 0,
            total_seen: 0,
            sample: HashSet::default(),
            top_counters: (config.track_top_k > 0).then(TopCounters::new),
            rng,
        })
    }

    /// Observe next item of the stream
    #[inline]
    pub fn observe(&mut self, item: T)
    where
        T: Clone,
    {
        self.total_seen += 1;

        if self.config.coin.flip(&mut self.rng, self.round) {
            if let Some(top) = self.top_counters.as_mut() {
                top.add(item.clone(), round_scale(self.round));
                // items leaving the sample keep their counters, bound them in between rounds
                if top.len() >= self.capacity.saturating_mul(2) {
                    top.truncate(self.capacity);
                }
            }
            self.sample.insert(item);
        } else {
            self.sample.remove(&item);
        }

        // a thinning pass that keeps every item leaves the sample full, so repeat it
        while self.sample.len() >= self.capacity {
            self.advance_round();
        }
    }

    /// Move to the next round and thin the sample with fresh fair coins
    fn advance_round(&mut self) {
        self.round += 1;

        let rng = &mut self.rng;
        self.sample.retain(|_| fair_bit(rng));

        if let Some(top) = self.top_counters.as_mut() {
            top.truncate(self.capacity);
        }

        debug!(
            round = self.round,
            retained = self.sample.len(),
            capacity = self.capacity,
            total_seen = self.total_seen,
            "sample reached capacity, advanced round"
        );
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> usize {
        let scale = 1usize.checked_shl(self.round).unwrap_or(usize::MAX);
        let raw = self.sample.len().saturating_mul(scale);
        if self.config.cheat {
            raw.min(usize::try_from(self.total_seen).unwrap_or(usize::MAX))
        } else {
            raw
        }
    }

    /// Return whether the estimate is still an exact distinct count
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.round == 0
    }

    /// Return up to `track_top_k` items with their weights, heaviest first.
    ///
    /// Empty when top-k tracking is disabled.
    pub fn top_k(&self) -> Vec<(&T, u64)> {
        match &self.top_counters {
            Some(top) => top.top(self.config.track_top_k),
            None => Vec::new(),
        }
    }

    /// Return current sampling round
    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Return number of observed items, including duplicates
    #[inline]
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// Return whether no item was observed yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_seen == 0
    }

    /// Return maximum number of sampled items
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return number of currently sampled items
    #[inline]
    pub fn sample_len(&self) -> usize {
        self.sample.len()
    }

    /// Return iterator over currently sampled items
    pub fn sample(&self) -> impl Iterator<Item = &T> + '_ {
        self.sample.iter()
    }

    /// Return configuration the estimator was built with
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return approximate memory size of `CardinalityEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>()
            + self.sample.capacity() * size_of::<T>()
            + self.top_counters.as_ref().map_or(0, TopCounters::size_of)
    }
}

/// Weight of one successful observation at `round`
#[inline]
fn round_scale(round: u32) -> u64 {
    1u64.checked_shl(round).unwrap_or(u64::MAX)
}

impl<T, R, H> Debug for CardinalityEstimator<T, R, H>
where
    T: Hash + Eq,
    R: RngCore,
    H: Hasher + Default,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ round: {}, sample: {}, estimate: {}, exact: {} }}",
            self.round,
            self.sample.len(),
            self.estimate(),
            self.is_exact()
        )
    }
}
