//! Retry with exponential backoff around a fallible async operation.
//!
//! Generic over the operation and its error; knows nothing about flows. The
//! delay before attempt `k + 1` is `min(base_delay * backoff_factor^(k - 1), max_delay)`.
//! When `retryable` is non-empty, an error that matches none of its patterns
//! (by kind or by message, case-insensitively) is returned after one attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exposes a coarse error kind for retry classification.
pub trait Classify {
    fn kind(&self) -> Option<&str> {
        None
    }
}

impl Classify for String {}

impl Classify for &str {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    /// Kind or message patterns that may be retried. Empty = retry everything.
    pub retryable: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 10_000,
            retryable: vec!["rate_limited".into(), "network".into()],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64, max_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
            backoff_factor,
            max_delay_ms: max_delay.as_millis() as u64,
            retryable: vec![],
        }
    }

    /// Single attempt, no delay.
    pub fn no_retry() -> Self {
        RetryPolicy::new(1, Duration::ZERO, 1.0, Duration::ZERO)
    }

    #[must_use]
    pub fn with_retryable<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay after failed attempt `attempt` (1-based), before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max_delay_ms as f64).max(0.0)
        } else {
            self.max_delay_ms as f64
        };
        Duration::from_millis(capped.round() as u64)
    }

    pub fn is_retryable<E: Display + Classify>(&self, error: &E) -> bool {
        if self.retryable.is_empty() {
            return true;
        }
        let message = error.to_string().to_lowercase();
        let kind = error.kind().map(str::to_lowercase);
        self.retryable.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            kind.as_deref() == Some(pattern.as_str()) || message.contains(&pattern)
        })
    }
}

/// Last error of a retried operation, annotated with its label.
#[derive(Debug)]
pub struct RetryError<E> {
    pub label: String,
    pub attempts: u32,
    /// True when the error was not retryable and attempts were left unused.
    pub aborted: bool,
    pub last_error: E,
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        self.last_error
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.aborted {
            write!(
                f,
                "{} failed with a non-retryable error: {}",
                self.label, self.last_error
            )
        } else {
            write!(
                f,
                "{} failed after {} attempt(s): {}",
                self.label, self.attempts, self.last_error
            )
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last_error)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is used up.
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    label: &str,
    policy: &RetryPolicy,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + Classify,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(label, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !policy.is_retryable(&err) {
            tracing::warn!(label, attempt, error = %err, "non-retryable error, giving up");
            return Err(RetryError {
                label: label.to_string(),
                attempts: attempt,
                aborted: true,
                last_error: err,
            });
        }

        if attempt >= max_attempts {
            tracing::error!(label, attempts = attempt, error = %err, "retries exhausted");
            return Err(RetryError {
                label: label.to_string(),
                attempts: attempt,
                aborted: false,
                last_error: err,
            });
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(
            label,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "attempt failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
