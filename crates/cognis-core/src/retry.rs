//! Bounded, linear-backoff retry for log-client operations. Applies to the
//! append-only log only — HTTP operations are not retried automatically.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Run `operation` up to `attempts` times. Between attempts, sleeps for
/// `attempt * 100ms` (linear backoff, not exponential). On exhaustion,
/// returns the final attempt's error.
pub async fn with_retry<F, Fut, T, E>(attempts: u32, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    debug_assert!(attempts >= 1, "with_retry requires at least one attempt");
    let mut last_error = None;

    for attempt in 0..attempts.max(1) {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "log operation failed, retrying");
                last_error = Some(err);
                if attempt + 1 < attempts {
                    sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
                }
            }
        }
    }

    Err(last_error.expect("loop runs at least once"))
}
