//! Sleep abstraction
//!
//! The engine blocks between attempts through this trait, which keeps the
//! core independent of the standard library: embedded targets plug in their
//! own timer, tests plug in a no-op.

/// Blocking sleep, the engine's only side channel for time.
pub trait Sleeper {
    /// Block the calling thread for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

/// Sleeper backed by `std::thread::sleep`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdSleeper;

#[cfg(feature = "std")]
impl Sleeper for StdSleeper {
    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

/// Sleeper wrapping a plain function pointer.
///
/// The usual way to skip real sleeping in tests:
///
/// ```rust
/// use retry_strategies::{FnSleeper, Sleeper};
///
/// let sleeper = FnSleeper(|_| {});
/// sleeper.sleep_ms(10_000); // returns immediately
/// ```
#[derive(Clone, Copy)]
pub struct FnSleeper(pub fn(u64));

impl Sleeper for FnSleeper {
    fn sleep_ms(&self, ms: u64) {
        (self.0)(ms);
    }
}
