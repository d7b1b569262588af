//! Retry logic for part uploads.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_UPLOAD;
use crate::types::{Error, Result};

/// Bounded retry with capped exponential backoff.
///
/// `max_attempts` counts every call, including the first one. Every failure
/// is retried regardless of its kind until the attempts run out.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts (at least 1).
    pub max_attempts: u32,
    /// Delay before the second attempt; zero retries immediately.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            ..Self::default()
        }
    }

    /// Create a policy that retries without any delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Set the maximum backoff duration.
    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate the delay after the failed attempt with zero-based index `attempt`.
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_millis = (self.initial_backoff.as_millis() as f64)
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_millis as u64);
        backoff.min(self.max_backoff)
    }

    /// Runs `operation` until it succeeds, the attempts run out, or `cancel`
    /// fires.
    ///
    /// Returns the number of attempts made together with the outcome. On
    /// exhaustion the last error is returned. Cancellation is reported as
    /// `Err(Retry::Cancelled)` so the caller can tell it apart from an
    /// operation failure.
    pub async fn retry<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, Retry<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Retry::Cancelled),
                outcome = operation(attempt) => outcome,
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= max_attempts {
                return Err(Retry::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let backoff = self.calculate_backoff(attempt - 1);
            tracing::debug!(
                target: TRACING_TARGET_UPLOAD,
                attempt,
                max_attempts,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "retrying operation after backoff"
            );

            if !backoff.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Retry::Cancelled),
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }
}

/// Why [`RetryPolicy::retry`] gave up.
#[derive(Debug)]
pub enum Retry<E> {
    /// Every attempt failed; `last` is the final failure.
    Exhausted { attempts: u32, last: E },
    /// The cancellation token fired.
    Cancelled,
}

impl<E> Retry<E> {
    /// Converts a cancellation into the crate error for `operation`, passing
    /// exhaustion through `exhausted`.
    pub fn into_error(self, operation: &'static str, exhausted: impl FnOnce(u32, E) -> Error) -> Error {
        match self {
            Self::Exhausted { attempts, last } => exhausted(attempts, last),
            Self::Cancelled => Error::cancelled(operation),
        }
    }
}
