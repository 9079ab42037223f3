//! `f0-estimator` is a Rust crate designed to estimate the number of distinct elements in a stream
//! with memory bounded independently of the true cardinality.
//!
//! The estimator samples distinct items with probability `1 / 2^round` and halves the sample
//! whenever it fills up, which gives a relative error of at most `epsilon` with probability
//! at least `1 - delta`. It can optionally report an approximate top-k of the most frequent items.
//!
//! ```
//! use f0_estimator::{CardinalityEstimator, Config};
//!
//! let mut estimator = CardinalityEstimator::new(Config::default().with_top_k(2))?;
//! for word in ["to", "be", "or", "not", "to", "be"] {
//!     estimator.observe(word);
//! }
//!
//! assert!(estimator.is_exact());
//! assert_eq!(estimator.estimate(), 4);
//! assert_eq!(estimator.top_k(), vec![(&"to", 2), (&"be", 2)]);
//! # Ok::<(), f0_estimator::ConfigurationError>(())
//! ```
pub mod coin;
pub mod config;
pub mod error;
pub mod estimator;
mod top_k;

pub use coin::Coin;
pub use config::Config;
pub use error::ConfigurationError;
pub use estimator::CardinalityEstimator;

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub struct ReadmeDoctests;
