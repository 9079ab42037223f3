//! Errors returned when building a `CardinalityEstimator`.

use thiserror::Error;

/// Configuration rejected at construction time.
///
/// The estimator itself never fails once built, so this is the only error type
/// the crate exposes.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigurationError {
    #[error("epsilon must be finite and greater than 0, got {0}")]
    InvalidEpsilon(f64),

    #[error("delta must be in the open interval (0, 1), got {0}")]
    InvalidDelta(f64),

    #[error("max_items must be at least 1, got {0}")]
    InvalidMaxItems(u64),
}
