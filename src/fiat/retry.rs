//! Bounded retry around a fetch-then-parse query.
//!
//! Price APIs rate limit aggressively, so transient fetch and parse failures
//! are retried with backoff before the last error is surfaced.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::PriceError;

/// Retry behavior for price queries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the initial one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate the backoff delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base =
            self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped as u64)
    }
}

/// Runs `fetch` and hands the raw bytes to `parse`, retrying both steps on
/// failure up to the configured attempt bound. Exhausting the attempts
/// surfaces the last error unchanged.
///
/// The only suspension points are `fetch` itself and the backoff sleep, both
/// cancel-safe, so dropping the returned future (e.g. under
/// `tokio::time::timeout`) stops retrying promptly.
pub async fn retry_query<Fetch, Fut, Parse, T>(
    fetch: Fetch,
    parse: Parse,
    config: &RetryConfig,
) -> Result<T, PriceError>
where
    Fetch: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<u8>, PriceError>>,
    Parse: Fn(&[u8]) -> Result<T, PriceError>,
{
    let attempts = config.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(config.delay_for_attempt(attempt - 1)).await;
        }

        let raw = match fetch().await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(attempt, error = %err, "price fetch failed");
                last_err = Some(err);
                continue;
            }
        };

        match parse(&raw) {
            Ok(parsed) => return Ok(parsed),
            Err(err) => {
                warn!(attempt, error = %err, "price parse failed");
                last_err = Some(err);
            }
        }
    }

    Err(last_err.expect("at least one attempt is made"))
}
