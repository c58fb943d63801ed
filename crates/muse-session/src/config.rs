//! Session manager configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

// Retry constraints
pub const MIN_MAX_ATTEMPTS: u32 = 1;
pub const MAX_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const MIN_INITIAL_DELAY_MS: u64 = 1;
pub const MAX_INITIAL_DELAY_MS: u64 = 60_000;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;

pub const MAX_MAX_DELAY_MS: u64 = 300_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

pub const MIN_BACKOFF_MULTIPLIER: f64 = 1.0;
pub const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Backoff policy for profile store writes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Total attempts, including the first one.
  pub max_attempts:       u32,
  /// Delay after the first failed attempt.
  pub initial_delay_ms:   u64,
  /// Upper bound for any single delay.
  pub max_delay_ms:       u64,
  /// Factor applied to the delay after every failed attempt.
  pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts:       DEFAULT_MAX_ATTEMPTS,
      initial_delay_ms:   DEFAULT_INITIAL_DELAY_MS,
      max_delay_ms:       DEFAULT_MAX_DELAY_MS,
      backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
    }
  }
}

impl RetryConfig {
  pub fn initial_delay(&self) -> Duration {
    Duration::from_millis(self.initial_delay_ms)
  }

  pub fn max_delay(&self) -> Duration { Duration::from_millis(self.max_delay_ms) }

  pub fn validate(&self) -> Result<()> {
    if !(MIN_MAX_ATTEMPTS..=MAX_MAX_ATTEMPTS).contains(&self.max_attempts) {
      return Err(Error::Config(format!(
        "retry.max_attempts must be {MIN_MAX_ATTEMPTS}-{MAX_MAX_ATTEMPTS}, got {}",
        self.max_attempts
      )));
    }

    if !(MIN_INITIAL_DELAY_MS..=MAX_INITIAL_DELAY_MS)
      .contains(&self.initial_delay_ms)
    {
      return Err(Error::Config(format!(
        "retry.initial_delay_ms must be {MIN_INITIAL_DELAY_MS}-{MAX_INITIAL_DELAY_MS}, got {}",
        self.initial_delay_ms
      )));
    }

    if self.max_delay_ms < self.initial_delay_ms
      || self.max_delay_ms > MAX_MAX_DELAY_MS
    {
      return Err(Error::Config(format!(
        "retry.max_delay_ms must be between initial_delay_ms ({}) and {MAX_MAX_DELAY_MS}, got {}",
        self.initial_delay_ms, self.max_delay_ms
      )));
    }

    if !(MIN_BACKOFF_MULTIPLIER..=MAX_BACKOFF_MULTIPLIER)
      .contains(&self.backoff_multiplier)
    {
      return Err(Error::Config(format!(
        "retry.backoff_multiplier must be {MIN_BACKOFF_MULTIPLIER}-{MAX_BACKOFF_MULTIPLIER}, got {}",
        self.backoff_multiplier
      )));
    }

    Ok(())
  }
}

/// Runtime configuration for [`crate::SessionManager`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  pub retry: RetryConfig,
}

impl SessionConfig {
  pub fn validate(&self) -> Result<()> { self.retry.validate() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    let config = SessionConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.initial_delay(), Duration::from_secs(1));
    assert_eq!(config.retry.backoff_multiplier, 2.0);
  }

  #[test]
  fn rejects_zero_attempts() {
    let retry = RetryConfig { max_attempts: 0, ..RetryConfig::default() };
    assert!(matches!(retry.validate(), Err(Error::Config(_))));
  }

  #[test]
  fn rejects_max_delay_below_initial() {
    let retry = RetryConfig {
      initial_delay_ms: 500,
      max_delay_ms: 100,
      ..RetryConfig::default()
    };
    assert!(matches!(retry.validate(), Err(Error::Config(_))));
  }

  #[test]
  fn rejects_shrinking_backoff() {
    let retry = RetryConfig {
      backoff_multiplier: 0.5,
      ..RetryConfig::default()
    };
    assert!(matches!(retry.validate(), Err(Error::Config(_))));
  }
}
