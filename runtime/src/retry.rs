//! Exponential backoff for transient failures.
//!
//! Screens use this for loads the user never asked for explicitly (such as
//! the search history read on screen start), where there is no retry button
//! to press and a transient storage or network hiccup should not leave the
//! screen stuck.
//!
//! # Example
//!
//! ```rust
//! use storefront_runtime::retry::{RetryPolicy, retry_with_backoff};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(5)
//!     .initial_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(10))
//!     .build();
//!
//! let history = retry_with_backoff(&policy, || async {
//!     Ok::<_, String>(vec!["motorola".to_string()])
//! }).await?;
//! # Ok(())
//! # }
//! ```

use rand::Rng;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule for retried operations.
///
/// Defaults: 3 retries, 100ms first delay doubling up to 30s, no jitter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
    /// Scale each delay by a random factor in `[0.5, 1.0]`
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Start from the default policy
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// A policy that gives up after the first failure
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero-based)
    ///
    /// `min(initial_delay * multiplier^attempt, max_delay)`, scaled by a
    /// random factor in `[0.5, 1.0]` when jitter is enabled.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )] // Delays are far below the precision limits involved
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let grown = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = grown.min(self.max_delay.as_millis() as f64);

        let scale = if self.jitter {
            rand::thread_rng().gen_range(0.5..=1.0)
        } else {
            1.0
        };

        Duration::from_millis((capped * scale) as u64)
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Set the number of retries
    #[must_use]
    pub const fn max_retries(mut self, max_retries: usize) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.policy.multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub const fn jitter(mut self, jitter: bool) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Finish the policy
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Run `operation` until it succeeds or the policy runs out of retries.
///
/// # Errors
///
/// Returns the error of the last attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_predicate(policy, operation, |_| true).await
}

/// Like [`retry_with_backoff`], but only errors accepted by `is_retryable`
/// are retried.
///
/// ```rust
/// use storefront_runtime::retry::{RetryPolicy, retry_with_predicate};
///
/// # async fn example() -> Result<(), String> {
/// let terms = retry_with_predicate(
///     &RetryPolicy::default(),
///     || async { Ok::<_, String>(vec!["smart tv".to_string()]) },
///     |err: &String| err.contains("offline"),
/// ).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the first error `is_retryable` rejects, or the error of the last
/// attempt.
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retries = 0;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(retries, "Operation recovered after retrying");
                }
                return Ok(value);
            },
            Err(error) => error,
        };

        if !is_retryable(&error) {
            tracing::debug!(%error, "Permanent failure, not retrying");
            return Err(error);
        }
        if retries >= policy.max_retries {
            tracing::warn!(retries, %error, "Giving up after exhausting retries");
            return Err(error);
        }

        let delay = policy.delay_for_attempt(retries);
        tracing::debug!(retry = retries + 1, delay_ms = delay.as_millis(), %error, "Retrying");
        tokio::time::sleep(delay).await;
        retries += 1;
    }
}
