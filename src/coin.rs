//! ## Round coin
//! At round `k` every observed item is kept with probability `1 / 2^k`.
//!
//! Two formulations of that biased coin are supported:
//! - `BitAnd`: draws `k` independent fair bits and succeeds iff all of them are 1.
//!   Bits are drawn 64 at a time, so any `k` works without overflow.
//! - `UniformRange`: draws a uniform integer in `[0, 2^k)` and succeeds iff it is 0.
//!   Uses `u64` below round 64, `u128` below round 128 and `BitAnd` beyond that.
//!
//! Both succeed with probability exactly `1 / 2^k`.

use enum_dispatch::enum_dispatch;
use rand::{Rng, RngCore};

/// Coin formulations supported by `CardinalityEstimator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
#[enum_dispatch]
pub enum Coin {
    BitAnd(BitAndCoin),
    UniformRange(UniformRangeCoin),
}

/// Coin trait which must be implemented by all coin formulations.
#[enum_dispatch(Coin)]
pub trait CoinTrait {
    /// Return `true` with probability `1 / 2^round`
    fn flip(&self, rng: &mut dyn RngCore, round: u32) -> bool;
}

impl Default for Coin {
    fn default() -> Self {
        Coin::BitAnd(BitAndCoin)
    }
}

/// Success iff `round` fair bits are all set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitAndCoin;

impl CoinTrait for BitAndCoin {
    #[inline]
    fn flip(&self, rng: &mut dyn RngCore, round: u32) -> bool {
        let mut remaining = round;
        while remaining > 0 {
            let bits = remaining.min(u64::BITS);
            let mask = u64::MAX >> (u64::BITS - bits);
            if rng.next_u64() & mask != mask {
                return false;
            }
            remaining -= bits;
        }
        true
    }
}

/// Success iff a uniform draw from `[0, 2^round)` is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformRangeCoin;

impl CoinTrait for UniformRangeCoin {
    #[inline]
    fn flip(&self, rng: &mut dyn RngCore, round: u32) -> bool {
        if round < u64::BITS {
            rng.gen_range(0..1u64 << round) == 0
        } else if round < u128::BITS {
            rng.gen_range(0..1u128 << round) == 0
        } else {
            BitAndCoin.flip(rng, round)
        }
    }
}

/// Fair coin used when thinning the sample.
#[inline]
pub(crate) fn fair_bit<R: RngCore + ?Sized>(rng: &mut R) -> bool {
    rng.gen()
}
