//! Estimator configuration and sample capacity derivation.
//!
//! The sample capacity is derived once from `max_items`, `epsilon` and `delta`:
//!
//! `capacity = min(max_items, ceil((12 / epsilon^2) * log2(8 * max_items / delta)))`
//!
//! clamped to at least 1. For example:
//! - `max_items = 1_000_000`, `epsilon = 0.1`, `delta = 0.1`: 31505 items
//! - `max_items = u64::MAX`, `epsilon = 0.1`, `delta = 0.1`: 84387 items
//! - `max_items = 1_000`: capped at 1000 items

use crate::coin::Coin;
use crate::error::ConfigurationError;

/// Default relative-error target
pub const DEFAULT_EPSILON: f64 = 0.1;
/// Default failure-probability target
pub const DEFAULT_DELTA: f64 = 0.1;

/// Configuration of a `CardinalityEstimator`, immutable once the estimator is built.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "with_serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Config {
    /// Upper bound on the number of items ever observed. Only used to size the sample.
    ///
    /// The capacity never exceeds `max_items`, so tiny values degenerate: at 1 the sample
    /// is emptied by every observation and the estimate stays 0.
    pub max_items: u64,
    /// Relative-error target
    pub epsilon: f64,
    /// Failure-probability target
    pub delta: f64,
    /// Number of top items to report, 0 disables frequency tracking
    pub track_top_k: usize,
    /// Never report more distinct items than items observed
    pub cheat: bool,
    /// Formulation of the `1 / 2^round` coin
    pub coin: Coin,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: u64::MAX,
            epsilon: DEFAULT_EPSILON,
            delta: DEFAULT_DELTA,
            track_top_k: 0,
            cheat: false,
            coin: Coin::default(),
        }
    }
}

impl Config {
    /// Set the upper bound on observed items.
    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = max_items;
        self
    }

    /// Set the relative-error target.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the failure-probability target.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Enable top-k tracking for `k` items (0 disables it).
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.track_top_k = k;
        self
    }

    /// Clamp estimates to the running total of observed items.
    pub fn with_cheat(mut self, cheat: bool) -> Self {
        self.cheat = cheat;
        self
    }

    /// Set the coin formulation.
    pub fn with_coin(mut self, coin: impl Into<Coin>) -> Self {
        self.coin = coin.into();
        self
    }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigurationError::InvalidEpsilon(self.epsilon));
        }
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(ConfigurationError::InvalidDelta(self.delta));
        }
        if self.max_items == 0 {
            return Err(ConfigurationError::InvalidMaxItems(self.max_items));
        }
        Ok(())
    }

    /// Validate the configuration and return the derived sample capacity.
    pub fn capacity(&self) -> Result<usize, ConfigurationError> {
        self.validate()?;
        Ok(derive_capacity(self.max_items, self.epsilon, self.delta))
    }
}

/// Capacity formula, assuming validated parameters
#[inline]
fn derive_capacity(max_items: u64, epsilon: f64, delta: f64) -> usize {
    let bound = (12.0 / epsilon.powi(2)) * (8.0 * max_items as f64 / delta).log2();
    // float to int casts saturate, so a huge bound lands on u64::MAX
    let capacity = (bound.ceil() as u64).min(max_items).max(1);
    usize::try_from(capacity).unwrap_or(usize::MAX)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1_000, 0.1, 0.1 => 1_000; "capped by max items")]
    #[test_case(1_000, 0.5, 0.5 => 671)]
    #[test_case(1_000_000, 0.1, 0.1 => 31_505)]
    #[test_case(1_000_000, 0.5, 0.5 => 1_149)]
    #[test_case(1_000_000, 1.0, 0.5 => 288)]
    #[test_case(1_000_000, 2.0, 0.9 => 70)]
    #[test_case(1_000_000_000, 0.2, 0.05 => 11_166)]
    #[test_case(u64::MAX, 0.1, 0.1 => 84_387; "default max items")]
    #[test_case(1, 0.1, 0.1 => 1; "single item")]
    fn test_capacity(max_items: u64, epsilon: f64, delta: f64) -> usize {
        Config::default()
            .with_max_items(max_items)
            .with_epsilon(epsilon)
            .with_delta(delta)
            .capacity()
            .unwrap()
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(Config::default().capacity(), Ok(84_387));
    }

    #[test]
    fn test_tiny_epsilon_saturates() {
        let config = Config::default().with_max_items(500).with_epsilon(1e-200);
        assert_eq!(config.capacity(), Ok(500));
    }

    #[test_case(Config::default().with_epsilon(0.0) => matches Err(ConfigurationError::InvalidEpsilon(_)); "zero epsilon")]
    #[test_case(Config::default().with_epsilon(-0.5) => matches Err(ConfigurationError::InvalidEpsilon(_)); "negative epsilon")]
    #[test_case(Config::default().with_epsilon(f64::NAN) => matches Err(ConfigurationError::InvalidEpsilon(_)); "nan epsilon")]
    #[test_case(Config::default().with_epsilon(f64::INFINITY) => matches Err(ConfigurationError::InvalidEpsilon(_)); "infinite epsilon")]
    #[test_case(Config::default().with_delta(0.0) => matches Err(ConfigurationError::InvalidDelta(_)); "zero delta")]
    #[test_case(Config::default().with_delta(1.0) => matches Err(ConfigurationError::InvalidDelta(_)); "unit delta")]
    #[test_case(Config::default().with_delta(1.5) => matches Err(ConfigurationError::InvalidDelta(_)); "large delta")]
    #[test_case(Config::default().with_delta(f64::NAN) => matches Err(ConfigurationError::InvalidDelta(_)); "nan delta")]
    #[test_case(Config::default().with_max_items(0) => matches Err(ConfigurationError::InvalidMaxItems(0)); "zero max items")]
    #[test_case(Config::default().with_epsilon(3.0).with_delta(0.999) => matches Ok(_); "loose bounds")]
    fn test_validate(config: Config) -> Result<(), ConfigurationError> {
        config.validate()
    }

    #[test]
    fn test_error_messages() {
        let err = Config::default().with_delta(1.5).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "delta must be in the open interval (0, 1), got 1.5"
        );
    }

    #[cfg(feature = "with_serde")]
    #[test]
    fn test_deserialize_partial_config() {
        use crate::coin::UniformRangeCoin;

        let config: Config =
            serde_json::from_str(r#"{"epsilon": 0.05, "track_top_k": 10, "coin": {"UniformRange": null}}"#)
                .expect("deserialization failed");
        assert_eq!(
            config,
            Config::default()
                .with_epsilon(0.05)
                .with_top_k(10)
                .with_coin(UniformRangeCoin)
        );
    }
}
