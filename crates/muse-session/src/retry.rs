//! Exponential backoff around fallible async operations.

use std::{fmt::Display, future::Future, time::Duration};

use tokio::time::sleep;

use crate::config::RetryConfig;

/// Run `operation` until it succeeds or `config.max_attempts` attempts have
/// failed, sleeping between attempts. The delay starts at
/// `config.initial_delay_ms` and is multiplied by `config.backoff_multiplier`
/// after each failure, capped at `config.max_delay_ms`. Returns the last error
/// once attempts are exhausted.
pub async fn with_retry<F, Fut, T, E>(
  config: &RetryConfig,
  operation_name: &str,
  mut operation: F,
) -> Result<T, E>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: Display,
{
  let max_attempts = config.max_attempts.max(1);
  let mut attempts = 0;
  let mut delay = config.initial_delay();

  loop {
    attempts += 1;

    match operation().await {
      Ok(value) => {
        if attempts > 1 {
          tracing::info!(operation = operation_name, attempts, "succeeded after retry");
        }
        return Ok(value);
      }
      Err(err) if attempts >= max_attempts => {
        tracing::warn!(
          operation = operation_name,
          attempts,
          error = %err,
          "giving up"
        );
        return Err(err);
      }
      Err(err) => {
        tracing::debug!(
          operation = operation_name,
          attempt = attempts,
          error = %err,
          ?delay,
          "attempt failed, retrying"
        );

        sleep(delay).await;

        delay = next_delay(delay, config);
      }
    }
  }
}

/// Scale `delay` by the multiplier, capped at the configured maximum. A
/// multiplier that yields a negative delay is treated as zero and one that
/// is not finite jumps straight to the cap.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
  let cap = config.max_delay().as_secs_f64();
  let scaled = delay.as_secs_f64() * config.backoff_multiplier;
  if scaled.is_finite() {
    Duration::from_secs_f64(scaled.clamp(0.0, cap))
  } else {
    config.max_delay()
  }
}
