//! Composable retry strategies and a blocking retry engine.
//!
//! A retry strategy is a lazily evaluated, possibly infinite sequence of
//! delays in milliseconds — any `Iterator<Item = u64>` qualifies. Generators
//! build primitive sequences, manipulators reshape them, and the engine
//! drives a fallible operation through the result, reporting every attempt
//! to an optional observer.
//!
//! # Features
//!
//! - **Lazy sequences**: strategies stay unbounded until truncated;
//!   composition never materializes a schedule
//! - **Uniform jitter**: integer-exact randomization over the inclusive
//!   delay window
//! - **Observers**: structured per-attempt reports with an early-abort
//!   verdict
//! - **no_std compatible**: bring your own [`Sleeper`] and RNG
//!
//! # Example
//!
//! ```rust
//! use retry_strategies::{multiplicative, Retryable, StrategyExt};
//!
//! let mut attempts = 0;
//! let result = (|| {
//!     attempts += 1;
//!     if attempts < 3 { Err("flaky") } else { Ok(attempts) }
//! })
//! .retry(multiplicative(1, 2.0)?.max_retries(5))
//! .call();
//!
//! assert_eq!(result, Ok(3));
//! # Ok::<(), retry_strategies::StrategyError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "serde")]
pub mod config;
pub mod jitter;
pub mod retry;
pub mod sleep;
pub mod strategy;
pub mod transform;

#[cfg(feature = "serde")]
pub use config::RetryConfig;
#[cfg(feature = "std")]
pub use jitter::randomize_delay;
pub use jitter::{Randomize, randomize_delay_with_rng};
pub use retry::{AttemptReport, DefaultObserver, RetryBuilder, Retryable, Status, Verdict};
#[cfg(feature = "std")]
pub use sleep::StdSleeper;
pub use sleep::{FnSleeper, Sleeper};
pub use strategy::{
    Additive, Constant, Multiplicative, Stop, Strategy, StrategyError, additive, additive_from,
    constant, immediate, multiplicative, stop,
};
pub use transform::{ClampDelay, MaxDelay, MaxDuration, StrategyExt};
