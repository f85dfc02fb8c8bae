//! Declarative retry configuration
//!
//! Lets a deployment describe its retry behavior in a config file instead of
//! code. A [`RetryConfig`] compiles into a strategy built from the same
//! generators and manipulators the programmatic API uses: multiplicative
//! backoff, clamped, optionally jittered, capped by a retry count.

use serde::{Deserialize, Serialize};

use crate::strategy::{Strategy, StrategyError, multiplicative};
use crate::transform::StrategyExt;

/// Serializable retry configuration.
///
/// Every field has a default, so partial documents deserialize cleanly:
///
/// ```rust
/// use retry_strategies::RetryConfig;
///
/// let config: RetryConfig = serde_json::from_str(r#"{"max_retries": 7}"#)?;
/// assert_eq!(config.max_retries, 7);
/// assert_eq!(config.initial_delay_ms, 100);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries (delays), not counting the first attempt.
    pub max_retries: usize,
    /// First delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Growth factor applied per retry.
    pub multiplier: f64,
    /// Ceiling applied to each delay before jitter.
    pub max_delay_ms: u64,
    /// Randomization factor in the open interval `(0, 1)`, or `None` for a
    /// deterministic schedule.
    pub rand_factor: Option<f64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 10_000,
            rand_factor: None,
        }
    }
}

impl RetryConfig {
    /// Compile the configuration into a strategy.
    ///
    /// The clamp bounds the pre-jitter delay, so the configured ceiling is
    /// the center of the jitter window, not its upper edge. Invalid
    /// multipliers and randomization factors surface here, before any
    /// attempt is made.
    pub fn build_strategy(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        let base = multiplicative(self.initial_delay_ms, self.multiplier)?
            .clamp_delay(self.max_delay_ms);
        let strategy: Box<dyn Strategy> = match self.rand_factor {
            Some(factor) => Box::new(base.randomize(factor)?.max_retries(self.max_retries)),
            None => Box::new(base.max_retries(self.max_retries)),
        };
        Ok(strategy)
    }
}
