//! Strategy manipulators
//!
//! Pure, lazy adapters over any strategy. Each one consumes its input and
//! returns a new strategy, so unbounded sequences stay unbounded until a
//! truncating adapter caps them. Composition is just method chaining:
//!
//! ```rust
//! use retry_strategies::{additive, StrategyExt};
//!
//! let delays: Vec<u64> = additive(100).clamp_delay(250).max_retries(4).collect();
//! assert_eq!(delays, vec![100, 200, 250, 250]);
//! ```

use core::iter::Take;

use rand::Rng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use rand::rngs::SmallRng;

use crate::jitter::Randomize;
use crate::strategy::{Strategy, StrategyError};

/// Extension methods available on every strategy.
///
/// Blanket-implemented for every `Iterator<Item = u64>`.
pub trait StrategyExt: Strategy {
    /// Cap every delay at `max_ms`, element-wise. Preserves length.
    fn clamp_delay(self, max_ms: u64) -> ClampDelay<Self>
    where
        Self: Sized,
    {
        ClampDelay {
            inner: self,
            max_ms,
        }
    }

    /// Keep the longest prefix of delays strictly below `max_ms`.
    ///
    /// The first delay at or above the bound is dropped along with
    /// everything after it.
    fn max_delay(self, max_ms: u64) -> MaxDelay<Self>
    where
        Self: Sized,
    {
        MaxDelay {
            inner: self,
            max_ms,
            done: false,
        }
    }

    /// Keep at most the first `retries` delays.
    ///
    /// Shorter strategies pass through unchanged.
    fn max_retries(self, retries: usize) -> Take<Self>
    where
        Self: Sized,
    {
        self.take(retries)
    }

    /// Keep delays while the running total stays inside `timeout_ms`.
    ///
    /// Delays are never rescaled. The delay that crosses the remaining
    /// budget is still emitted once — the schedule approximates wall-clock
    /// time, it never holds back an element that is already due.
    ///
    /// ```rust
    /// use retry_strategies::{constant, StrategyExt};
    ///
    /// let delays: Vec<u64> = constant(400).max_duration(1_000).collect();
    /// assert_eq!(delays, vec![400, 400, 400]);
    /// ```
    fn max_duration(self, timeout_ms: u64) -> MaxDuration<Self>
    where
        Self: Sized,
    {
        MaxDuration {
            inner: self,
            remaining_ms: timeout_ms,
        }
    }

    /// Randomize every delay with a caller-supplied RNG.
    ///
    /// See [`randomize_delay_with_rng`](crate::randomize_delay_with_rng) for
    /// the sampling law. `rand_factor` must lie in the open interval
    /// `(0, 1)`.
    fn randomize_with_rng<R: Rng>(
        self,
        rand_factor: f64,
        rng: R,
    ) -> Result<Randomize<Self, R>, StrategyError>
    where
        Self: Sized,
    {
        Randomize::new(rand_factor, self, rng)
    }

    /// Randomize every delay with a fresh OS-seeded RNG.
    ///
    /// ```rust
    /// use retry_strategies::{constant, StrategyExt};
    ///
    /// let delays: Vec<u64> = constant(1_000).randomize(0.1)?.take(3).collect();
    /// assert!(delays.iter().all(|&d| (900..=1_100).contains(&d)));
    /// # Ok::<(), retry_strategies::StrategyError>(())
    /// ```
    #[cfg(feature = "std")]
    fn randomize(self, rand_factor: f64) -> Result<Randomize<Self, SmallRng>, StrategyError>
    where
        Self: Sized,
    {
        Randomize::new(rand_factor, self, SmallRng::from_os_rng())
    }
}

impl<S: Strategy> StrategyExt for S {}

/// Strategy adapter for [`StrategyExt::clamp_delay`].
#[derive(Debug, Clone)]
pub struct ClampDelay<S> {
    inner: S,
    max_ms: u64,
}

impl<S: Strategy> Iterator for ClampDelay<S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.inner.next().map(|delay| delay.min(self.max_ms))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Strategy adapter for [`StrategyExt::max_delay`].
#[derive(Debug, Clone)]
pub struct MaxDelay<S> {
    inner: S,
    max_ms: u64,
    done: bool,
}

impl<S: Strategy> Iterator for MaxDelay<S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(delay) if delay < self.max_ms => Some(delay),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

/// Strategy adapter for [`StrategyExt::max_duration`].
#[derive(Debug, Clone)]
pub struct MaxDuration<S> {
    inner: S,
    remaining_ms: u64,
}

impl<S: Strategy> Iterator for MaxDuration<S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining_ms == 0 {
            return None;
        }
        let delay = self.inner.next()?;
        self.remaining_ms = self.remaining_ms.saturating_sub(delay);
        Some(delay)
    }
}
