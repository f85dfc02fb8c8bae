//! Blocking retry walkthrough
//!
//! Demonstrates strategy composition and the retry engine end to end.
//!
//! Run with: cargo run --example blocking_retry
//! Set RUST_LOG=debug to also see the engine's own logging.

use std::cell::Cell;

use retry_strategies::{
    Retryable, Status, StrategyError, StrategyExt, Verdict, additive, constant, multiplicative,
};

#[derive(Debug)]
enum ApiError {
    Timeout,
    RateLimited,
    NotFound,
}

fn main() -> Result<(), StrategyError> {
    env_logger::init();

    println!("=== retry-strategies blocking examples ===\n");

    // Example 1: multiplicative backoff with jitter, success after retries
    println!("1. Multiplicative backoff with 10% jitter:");
    let attempts = Cell::new(0u32);
    let result = (|| {
        attempts.set(attempts.get() + 1);
        println!("   attempt {}", attempts.get());
        if attempts.get() < 3 {
            Err(ApiError::Timeout)
        } else {
            Ok("fetched")
        }
    })
    .retry(
        multiplicative(100, 2.0)?
            .clamp_delay(2_000)
            .randomize(0.1)?
            .max_retries(5),
    )
    .observe(|report| {
        if report.status == Status::Retry {
            println!("   → retrying ({}ms slept so far)", report.slept_ms);
        }
        Verdict::Continue
    })
    .call();
    println!("   result: {result:?}\n");

    // Example 2: conditional retry, NotFound is not worth repeating
    println!("2. Conditional retry (only timeouts and rate limits):");
    attempts.set(0);
    let result: Result<&str, ApiError> = (|| {
        attempts.set(attempts.get() + 1);
        println!("   attempt {}", attempts.get());
        if attempts.get() == 1 {
            Err(ApiError::RateLimited)
        } else {
            Err(ApiError::NotFound)
        }
    })
    .retry(constant(50).max_retries(3))
    .when(|e| matches!(e, ApiError::Timeout | ApiError::RateLimited))
    .call();
    println!("   result: {result:?}\n");

    // Example 3: observer abort, with the retry budget tracked in context
    println!("3. Observer abort after a context-tracked retry budget:");
    attempts.set(0);
    let wasted_retries = Cell::new(0u32);
    let result: Result<&str, ApiError> = (|| {
        attempts.set(attempts.get() + 1);
        println!("   attempt {}", attempts.get());
        Err(ApiError::Timeout)
    })
    .retry(additive(25))
    .context(&wasted_retries)
    .observe(|report| {
        if let Some(count) = report.context {
            count.set(count.get() + 1);
            if count.get() == 3 {
                println!("   → three wasted retries, giving up early");
                return Verdict::Abort;
            }
        }
        Verdict::Continue
    })
    .call();
    println!(
        "   result: {result:?} after {} observed retries\n",
        wasted_retries.get()
    );

    // Example 4: strategy exhausted
    println!("4. Strategy exhausted:");
    attempts.set(0);
    let result: Result<&str, ApiError> = (|| {
        attempts.set(attempts.get() + 1);
        println!("   attempt {}", attempts.get());
        Err(ApiError::Timeout)
    })
    .retry(constant(20).max_retries(2))
    .observe(|report| {
        println!(
            "   → status {:?} on attempt {}",
            report.status, report.attempts
        );
        Verdict::Continue
    })
    .call();
    println!("   result: {result:?}");

    println!("\n=== all examples completed ===");
    Ok(())
}
