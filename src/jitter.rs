//! Delay randomization
//!
//! Spreads retry schedules out so that many clients recovering from the same
//! incident do not hammer a service in lockstep. A randomized delay is drawn
//! uniformly from the closed integer window `[delay * (1 - factor),
//! delay * (1 + factor)]`.
//!
//! The sampling expression is `min + unit * (max + 1 - min)` truncated, with
//! `unit` uniform in `[0, 1)`. The `+ 1` keeps the probability mass equal
//! across every integer in the window, including both endpoints; do not
//! "simplify" it away.

use rand::Rng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use rand::rngs::SmallRng;

use crate::strategy::StrategyError;

pub(crate) fn validate_rand_factor(rand_factor: f64) -> Result<f64, StrategyError> {
    if rand_factor > 0.0 && rand_factor < 1.0 {
        Ok(rand_factor)
    } else {
        Err(StrategyError::RandFactor { value: rand_factor })
    }
}

// Assumes a validated factor. `factor < 1` keeps the window non-negative.
pub(crate) fn sample<R: Rng>(rand_factor: f64, delay_ms: u64, rng: &mut R) -> u64 {
    let delta = delay_ms as f64 * rand_factor;
    let min_delay = delay_ms as f64 - delta;
    let max_delay = delay_ms as f64 + delta;
    let unit: f64 = rng.random();
    (min_delay + unit * (max_delay + 1.0 - min_delay)) as u64
}

/// Draw a randomized delay around `delay_ms` with a caller-supplied RNG.
///
/// Useful for deterministic tests and `no_std` environments. `rand_factor`
/// must lie in the open interval `(0, 1)`; the result stays within
/// `[delay * (1 - factor), delay * (1 + factor)]` and is never negative.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use retry_strategies::randomize_delay_with_rng;
///
/// let mut rng = SmallRng::seed_from_u64(42);
/// let delay = randomize_delay_with_rng(0.5, 1_000, &mut rng)?;
/// assert!((500..=1_500).contains(&delay));
/// # Ok::<(), retry_strategies::StrategyError>(())
/// ```
pub fn randomize_delay_with_rng<R: Rng>(
    rand_factor: f64,
    delay_ms: u64,
    rng: &mut R,
) -> Result<u64, StrategyError> {
    let factor = validate_rand_factor(rand_factor)?;
    Ok(sample(factor, delay_ms, rng))
}

/// Draw a randomized delay around `delay_ms` with a fresh OS-seeded RNG.
#[cfg(feature = "std")]
pub fn randomize_delay(rand_factor: f64, delay_ms: u64) -> Result<u64, StrategyError> {
    let mut rng = SmallRng::from_os_rng();
    randomize_delay_with_rng(rand_factor, delay_ms, &mut rng)
}

/// Strategy adapter that randomizes every delay of the underlying sequence.
///
/// Created by [`StrategyExt::randomize`](crate::StrategyExt::randomize) or
/// [`StrategyExt::randomize_with_rng`](crate::StrategyExt::randomize_with_rng).
/// Each traversal draws fresh random values; that is the point, not a
/// reproducibility bug.
#[derive(Debug, Clone)]
pub struct Randomize<S, R> {
    inner: S,
    rand_factor: f64,
    rng: R,
}

impl<S, R> Randomize<S, R> {
    pub(crate) fn new(rand_factor: f64, inner: S, rng: R) -> Result<Self, StrategyError> {
        let rand_factor = validate_rand_factor(rand_factor)?;
        Ok(Self {
            inner,
            rand_factor,
            rng,
        })
    }
}

impl<S, R> Iterator for Randomize<S, R>
where
    S: Iterator<Item = u64>,
    R: Rng,
{
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let delay = self.inner.next()?;
        Some(sample(self.rand_factor, delay, &mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
