//! Retry execution engine
//!
//! Drives a fallible operation through a strategy: run, classify the
//! outcome, report it to an optional observer, sleep, repeat. The engine is
//! fully synchronous and blocks the calling thread between attempts; the
//! [`Sleeper`] seam is the only place time passes.
//!
//! The engine never wraps errors. Whatever `E` the operation produces is the
//! `E` the caller gets back, whether retries were exhausted, the error was
//! ruled non-retryable, or the observer aborted.

use core::marker::PhantomData;

use log::{debug, warn};

use crate::sleep::Sleeper;
#[cfg(feature = "std")]
use crate::sleep::StdSleeper;
use crate::strategy::Strategy;

/// Outcome of a single attempt, as reported to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operation returned `Ok`; the engine is returning it.
    Success,
    /// The operation failed and another attempt follows after a delay.
    Retry,
    /// The operation failed with no delays left; the error is propagating.
    Failure,
}

/// Observer return value.
///
/// [`Verdict::Abort`] is the force-fail sentinel: returned on a
/// [`Status::Retry`] report, it makes the engine propagate the current error
/// immediately instead of sleeping, bypassing the rest of the strategy. On
/// terminal reports the verdict is ignored — the engine is already
/// returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Let the engine proceed normally.
    #[default]
    Continue,
    /// Propagate the current error now; skip the remaining retries.
    Abort,
}

/// Snapshot handed to the observer after every attempt.
#[derive(Debug)]
pub struct AttemptReport<'a, E, C = ()> {
    /// Operation executions so far, starting at 1.
    pub attempts: u32,
    /// Total delay consumed before the most recent attempt, in milliseconds.
    pub slept_ms: u64,
    /// How the attempt ended.
    pub status: Status,
    /// The failure, present on `Retry` and `Failure` reports.
    pub error: Option<&'a E>,
    /// Caller context, echoed verbatim from [`RetryBuilder::context`].
    pub context: Option<&'a C>,
}

/// Observer type used until [`RetryBuilder::observe`] replaces it.
pub type DefaultObserver<E, C> = fn(&AttemptReport<'_, E, C>) -> Verdict;

/// Extension trait that adds `.retry()` to functions and closures.
///
/// Automatically implemented for every `FnMut` returning `Result`. Any
/// `IntoIterator<Item = u64>` works as the strategy — a generator chain, a
/// `Vec`, or a plain array literal.
///
/// # Example
///
/// ```rust
/// use retry_strategies::{constant, Retryable, StrategyExt};
///
/// fn fetch_data() -> Result<String, std::io::Error> {
///     // ... operation that might fail
/// #   Ok("data".to_string())
/// }
///
/// let result = fetch_data.retry(constant(100).max_retries(3)).call();
/// # result.unwrap();
/// ```
pub trait Retryable<T, E> {
    /// Begin building a retry call around this operation.
    fn retry<S>(self, strategy: S) -> RetryBuilder<Self, S::IntoIter, T, E>
    where
        S: IntoIterator<Item = u64>,
        Self: Sized;
}

impl<F, T, E> Retryable<T, E> for F
where
    F: FnMut() -> Result<T, E>,
{
    fn retry<S>(self, strategy: S) -> RetryBuilder<Self, S::IntoIter, T, E>
    where
        S: IntoIterator<Item = u64>,
    {
        RetryBuilder {
            operation: self,
            delays: strategy.into_iter(),
            when: None,
            observer: None,
            context: None,
            _marker: PhantomData,
        }
    }
}

/// Builder for configuring and executing a retried operation.
///
/// Created by [`Retryable::retry`]. Configure with [`context`] (first, if at
/// all), [`when`], and [`observe`], then execute with [`call`] or
/// [`call_with_sleeper`].
///
/// [`context`]: RetryBuilder::context
/// [`when`]: RetryBuilder::when
/// [`observe`]: RetryBuilder::observe
/// [`call`]: RetryBuilder::call
/// [`call_with_sleeper`]: RetryBuilder::call_with_sleeper
pub struct RetryBuilder<F, S, T, E, W = fn(&E) -> bool, O = DefaultObserver<E, ()>, C = ()> {
    operation: F,
    delays: S,
    when: Option<W>,
    observer: Option<O>,
    context: Option<C>,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<F, S, T, E, W> RetryBuilder<F, S, T, E, W, DefaultObserver<E, ()>, ()> {
    /// Attach an opaque context value, echoed to the observer in every
    /// report.
    ///
    /// The engine never inspects or mutates the context; pass a reference to
    /// a `Cell`/`RefCell` when the observer needs to write through it. Must
    /// be called before [`observe`](RetryBuilder::observe) — afterwards the
    /// observer's type already fixes the context type and this method is no
    /// longer available.
    ///
    /// # Example
    ///
    /// ```rust
    /// use retry_strategies::{constant, Retryable, Status, StrategyExt, Verdict};
    ///
    /// let result = (|| Ok::<_, std::io::Error>(1))
    ///     .retry(constant(10).max_retries(3))
    ///     .context("billing-export")
    ///     .observe(|report| {
    ///         if report.status == Status::Retry {
    ///             eprintln!("{}: retrying", report.context.unwrap());
    ///         }
    ///         Verdict::Continue
    ///     })
    ///     .call();
    /// # result.unwrap();
    /// ```
    pub fn context<C>(self, context: C) -> RetryBuilder<F, S, T, E, W, DefaultObserver<E, C>, C> {
        RetryBuilder {
            operation: self.operation,
            delays: self.delays,
            when: self.when,
            observer: None,
            context: Some(context),
            _marker: PhantomData,
        }
    }
}

impl<F, S, T, E, W, O, C> RetryBuilder<F, S, T, E, W, O, C> {
    /// Only retry errors for which `predicate` returns `true`.
    ///
    /// A non-retryable error propagates immediately: no delay is consumed
    /// and the observer is not invoked for it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use retry_strategies::{constant, Retryable, StrategyExt};
    ///
    /// #[derive(Debug)]
    /// enum ApiError {
    ///     Timeout,
    ///     NotFound,
    /// }
    ///
    /// fn lookup() -> Result<String, ApiError> {
    ///     // ...
    /// #   Err(ApiError::NotFound)
    /// }
    ///
    /// let result = lookup
    ///     .retry(constant(100).max_retries(5))
    ///     .when(|e| matches!(e, ApiError::Timeout))
    ///     .call();
    /// # assert!(matches!(result, Err(ApiError::NotFound)));
    /// ```
    pub fn when<P>(self, predicate: P) -> RetryBuilder<F, S, T, E, P, O, C>
    where
        P: Fn(&E) -> bool,
    {
        RetryBuilder {
            operation: self.operation,
            delays: self.delays,
            when: Some(predicate),
            observer: self.observer,
            context: self.context,
            _marker: PhantomData,
        }
    }

    /// Install an observer invoked exactly once per attempt outcome.
    ///
    /// The observer runs synchronously on the calling thread. Its return
    /// value is only consulted on [`Status::Retry`] reports, where
    /// [`Verdict::Abort`] stops the engine; a panic inside the observer
    /// propagates unmasked.
    ///
    /// # Example
    ///
    /// ```rust
    /// use retry_strategies::{constant, Retryable, Status, StrategyExt, Verdict};
    ///
    /// let result = (|| Ok::<_, std::io::Error>("up"))
    ///     .retry(constant(50).max_retries(3))
    ///     .observe(|report| {
    ///         if report.status == Status::Retry {
    ///             eprintln!("attempt {} failed, {}ms slept", report.attempts, report.slept_ms);
    ///         }
    ///         Verdict::Continue
    ///     })
    ///     .call();
    /// # result.unwrap();
    /// ```
    pub fn observe<O2>(self, observer: O2) -> RetryBuilder<F, S, T, E, W, O2, C>
    where
        O2: FnMut(&AttemptReport<'_, E, C>) -> Verdict,
    {
        RetryBuilder {
            operation: self.operation,
            delays: self.delays,
            when: self.when,
            observer: Some(observer),
            context: self.context,
            _marker: PhantomData,
        }
    }
}

impl<F, S, T, E, W, O, C> RetryBuilder<F, S, T, E, W, O, C>
where
    F: FnMut() -> Result<T, E>,
    S: Strategy,
    W: Fn(&E) -> bool,
    O: FnMut(&AttemptReport<'_, E, C>) -> Verdict,
{
    /// Execute with the standard library's blocking sleep.
    #[cfg(feature = "std")]
    pub fn call(self) -> Result<T, E> {
        self.call_with_sleeper(StdSleeper)
    }

    /// Execute with a custom [`Sleeper`].
    ///
    /// This is the whole engine; [`call`](RetryBuilder::call) merely picks
    /// the sleeper. Use [`FnSleeper`](crate::sleep::FnSleeper) to skip real
    /// sleeping in tests or to bridge into another timing source.
    ///
    /// # Example
    ///
    /// ```rust
    /// use retry_strategies::{constant, FnSleeper, Retryable, StrategyExt};
    ///
    /// fn fetch_data() -> Result<String, std::io::Error> {
    ///     Ok("data".to_string())
    /// }
    ///
    /// let result = fetch_data
    ///     .retry(constant(100).max_retries(3))
    ///     .call_with_sleeper(FnSleeper(|_| {}));
    /// # result.unwrap();
    /// ```
    pub fn call_with_sleeper<Sl: Sleeper>(self, sleeper: Sl) -> Result<T, E> {
        let RetryBuilder {
            mut operation,
            mut delays,
            when,
            mut observer,
            context,
            ..
        } = self;

        let mut attempts: u32 = 1;
        let mut slept_ms: u64 = 0;

        loop {
            match operation() {
                Ok(value) => {
                    let report = AttemptReport {
                        attempts,
                        slept_ms,
                        status: Status::Success,
                        error: None,
                        context: context.as_ref(),
                    };
                    if let Some(observer) = observer.as_mut() {
                        observer(&report);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if let Some(when) = when.as_ref() {
                        if !when(&error) {
                            debug!("attempt {attempts} hit a non-retryable error, propagating");
                            return Err(error);
                        }
                    }

                    match delays.next() {
                        Some(delay_ms) => {
                            let report = AttemptReport {
                                attempts,
                                slept_ms,
                                status: Status::Retry,
                                error: Some(&error),
                                context: context.as_ref(),
                            };
                            let verdict = match observer.as_mut() {
                                Some(observer) => observer(&report),
                                None => Verdict::Continue,
                            };
                            if verdict == Verdict::Abort {
                                debug!("observer aborted after attempt {attempts}, propagating");
                                return Err(error);
                            }

                            debug!("attempt {attempts} failed, retrying in {delay_ms}ms");
                            sleeper.sleep_ms(delay_ms);
                            attempts += 1;
                            slept_ms = slept_ms.saturating_add(delay_ms);
                        }
                        None => {
                            warn!("strategy exhausted after {attempts} attempt(s), propagating");
                            let report = AttemptReport {
                                attempts,
                                slept_ms,
                                status: Status::Failure,
                                error: Some(&error),
                                context: context.as_ref(),
                            };
                            if let Some(observer) = observer.as_mut() {
                                observer(&report);
                            }
                            return Err(error);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleep::FnSleeper;
    use crate::strategy::{constant, stop};
    use crate::transform::StrategyExt;
    use core::cell::{Cell, RefCell};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    struct RecordingSleeper<'a>(&'a Cell<u64>);

    impl Sleeper for RecordingSleeper<'_> {
        fn sleep_ms(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    #[test]
    fn first_attempt_success_needs_no_strategy() {
        let result = (|| Ok::<_, TestError>(7))
            .retry(stop())
            .call_with_sleeper(FnSleeper(|_| {}));
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn success_reports_attempt_one_with_nothing_slept() {
        let reports = RefCell::new(Vec::new());
        let result = (|| Ok::<_, TestError>("done"))
            .retry(constant(5).max_retries(3))
            .observe(|report| {
                reports.borrow_mut().push((
                    report.attempts,
                    report.status,
                    report.slept_ms,
                    report.error.is_some(),
                ));
                Verdict::Continue
            })
            .call_with_sleeper(FnSleeper(|_| {}));
        assert_eq!(result, Ok("done"));
        assert_eq!(reports.into_inner(), vec![(1, Status::Success, 0, false)]);
    }

    #[test]
    fn single_delay_strategy_allows_one_retry() {
        let calls = Cell::new(0u32);
        let reports = RefCell::new(Vec::new());
        let slept = Cell::new(0u64);

        let result = (|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(TestError::Transient)
            } else {
                Ok(calls.get())
            }
        })
        .retry([12u64])
        .observe(|report| {
            reports
                .borrow_mut()
                .push((report.attempts, report.status, report.slept_ms));
            Verdict::Continue
        })
        .call_with_sleeper(RecordingSleeper(&slept));

        assert_eq!(result, Ok(2));
        assert_eq!(calls.get(), 2);
        assert_eq!(
            reports.into_inner(),
            vec![(1, Status::Retry, 0), (2, Status::Success, 12)]
        );
        assert_eq!(slept.get(), 12);
    }

    #[test]
    fn exhausted_strategy_reports_failure_and_propagates() {
        let reports = RefCell::new(Vec::new());
        let result = (|| Err::<u32, _>(TestError::Transient))
            .retry([123u64])
            .observe(|report| {
                reports.borrow_mut().push((report.attempts, report.status));
                Verdict::Continue
            })
            .call_with_sleeper(FnSleeper(|_| {}));

        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(
            reports.into_inner(),
            vec![(1, Status::Retry), (2, Status::Failure)]
        );
    }

    #[test]
    fn non_retryable_errors_skip_callback_and_strategy() {
        let calls = Cell::new(0u32);
        let observed = Cell::new(0u32);

        let result = (|| {
            calls.set(calls.get() + 1);
            Err::<u32, _>(TestError::Fatal)
        })
        .retry(constant(10))
        .when(|e| matches!(e, TestError::Transient))
        .observe(|_| {
            observed.set(observed.get() + 1);
            Verdict::Continue
        })
        .call_with_sleeper(FnSleeper(|_| {}));

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.get(), 1);
        assert_eq!(observed.get(), 0);
    }

    #[test]
    fn observer_abort_stops_with_retries_remaining() {
        let calls = Cell::new(0u32);
        let result = (|| {
            calls.set(calls.get() + 1);
            Err::<u32, _>(TestError::Transient)
        })
        .retry(constant(10))
        .observe(|report| {
            if report.attempts == 2 {
                Verdict::Abort
            } else {
                Verdict::Continue
            }
        })
        .call_with_sleeper(FnSleeper(|_| {}));

        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn slept_accumulates_the_consumed_delays() {
        let calls = Cell::new(0u32);
        let slept_total = Cell::new(0u64);
        let slept_seen = RefCell::new(Vec::new());

        let result = (|| {
            calls.set(calls.get() + 1);
            if calls.get() < 4 {
                Err(TestError::Transient)
            } else {
                Ok(calls.get())
            }
        })
        .retry([5u64, 10, 20])
        .observe(|report| {
            slept_seen.borrow_mut().push(report.slept_ms);
            Verdict::Continue
        })
        .call_with_sleeper(RecordingSleeper(&slept_total));

        assert_eq!(result, Ok(4));
        assert_eq!(slept_seen.into_inner(), vec![0, 5, 15, 35]);
        assert_eq!(slept_total.get(), 35);
    }

    #[test]
    fn context_reaches_every_report() {
        let calls = Cell::new(0u32);
        let seen = RefCell::new(Vec::new());

        let result = (|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(TestError::Transient)
            } else {
                Ok(calls.get())
            }
        })
        .retry(constant(1))
        .context("checkout-service")
        .observe(|report| {
            seen.borrow_mut().push(*report.context.unwrap());
            Verdict::Continue
        })
        .call_with_sleeper(FnSleeper(|_| {}));

        assert_eq!(result, Ok(3));
        assert_eq!(seen.into_inner(), vec!["checkout-service"; 3]);
    }

    #[test]
    fn mutable_context_cell_tracks_retries() {
        let retries = Cell::new(0u32);
        let calls = Cell::new(0u32);

        let result = (|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(TestError::Transient)
            } else {
                Ok(calls.get())
            }
        })
        .retry(constant(0))
        .context(&retries)
        .observe(|report| {
            if report.status == Status::Retry {
                if let Some(cell) = report.context {
                    cell.set(cell.get() + 1);
                }
            }
            Verdict::Continue
        })
        .call_with_sleeper(FnSleeper(|_| {}));

        assert_eq!(result, Ok(3));
        assert_eq!(retries.get(), 2);
    }

    #[cfg(feature = "std")]
    #[test]
    fn call_sleeps_with_the_std_sleeper() {
        let calls = Cell::new(0u32);
        let start = std::time::Instant::now();

        let result = (|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(TestError::Transient)
            } else {
                Ok(calls.get())
            }
        })
        .retry(constant(10).max_retries(2))
        .call();

        assert_eq!(result, Ok(2));
        assert!(start.elapsed().as_millis() >= 9);
    }
}
