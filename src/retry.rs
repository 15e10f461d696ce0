//! Retrying operations that SendGrid rejects with rate limiting.
//!
//! [`retry_on_rate_limit`] runs an operation, and when the returned error
//! classifies as rate limited it waits (the reset hint if SendGrid sent one,
//! an exponential fallback otherwise) and runs it again. Any other error is
//! returned on first occurrence.
//!
//! The helper itself does not log: callers decide what to report.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use sendgrid_provider::retry::{retry_on_rate_limit, Classification, Classify, RetryPolicy};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! struct Throttled;
//!
//! impl std::fmt::Display for Throttled {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "throttled")
//!     }
//! }
//!
//! impl Classify for Throttled {
//!     fn classify(&self) -> Classification {
//!         Classification::RateLimited { reset_after: Some(Duration::from_millis(1)) }
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::default();
//! let cancel = CancellationToken::new();
//! let value = retry_on_rate_limit(&policy, &cancel, || async { Ok::<_, Throttled>(42) })
//!     .await
//!     .unwrap();
//! assert_eq!(value, 42);
//! # });
//! ```

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How an error should be treated by the retrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The upstream rejected the call because of rate limiting.
    RateLimited {
        /// How long until the limit resets, when the upstream said so.
        reset_after: Option<Duration>,
    },
    /// Any other failure. Never retried.
    Fatal,
}

impl Classification {
    /// Whether this classification leads to another attempt.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Errors that know whether they signal rate limiting.
///
/// Implementations must be pure: the same error value always yields the
/// same classification.
pub trait Classify {
    /// Classify this error.
    fn classify(&self) -> Classification;
}

/// Bounds and delays for [`retry_on_rate_limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of invocations of the operation, first call included.
    pub max_attempts: u32,
    /// Wait before the first retry when no reset hint is present.
    pub initial_backoff: Duration,
    /// Upper bound for the exponential fallback wait.
    pub max_backoff: Duration,
    /// Total time budget across attempts and waits. `None` disables it.
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            max_elapsed: Some(Duration::from_secs(20 * 60)),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt bound and default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the fallback backoff range.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the total time budget.
    pub fn with_max_elapsed(mut self, max_elapsed: Option<Duration>) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// The wait before retry number `retry` (1-based) after a rate-limited
    /// failure. A non-zero reset hint is honored as-is. Without one, or
    /// when the reset time has already passed, the fallback doubles from
    /// `initial_backoff` up to `max_backoff`.
    pub fn delay_for(&self, retry: u32, reset_after: Option<Duration>) -> Duration {
        match reset_after.filter(|hint| !hint.is_zero()) {
            Some(hint) => hint,
            None => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                self.initial_backoff
                    .saturating_mul(factor)
                    .min(self.max_backoff)
            },
        }
    }
}

/// The ways [`retry_on_rate_limit`] can fail.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error that is not rate limiting.
    #[error(transparent)]
    Operation(E),

    /// The operation stayed rate limited until the attempt or time bound.
    #[error("gave up after {attempts} rate-limited attempt(s): {last}")]
    Exhausted {
        /// Number of times the operation ran.
        attempts: u32,
        /// The last rate-limit error observed.
        last: E,
    },

    /// The cancellation token fired before the operation could finish.
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Number of times the operation ran.
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    /// The underlying operation error, if there is one.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(err) | Self::Exhausted { last: err, .. } => Some(err),
            Self::Cancelled { .. } => None,
        }
    }

    /// Whether this is the "gave up after repeated rate limiting" case.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Run `operation`, retrying it while it fails with rate limiting.
///
/// Stops with [`RetryError::Exhausted`] when the next attempt would exceed
/// `policy.max_attempts`, or when waiting would overrun `policy.max_elapsed`.
/// Stops with [`RetryError::Cancelled`] as soon as `cancel` fires, including
/// in the middle of a wait.
pub async fn retry_on_rate_limit<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Classify,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts });
        }

        attempts += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let reset_after = match err.classify() {
            Classification::Fatal => return Err(RetryError::Operation(err)),
            Classification::RateLimited { reset_after } => reset_after,
        };

        if attempts >= policy.max_attempts {
            return Err(RetryError::Exhausted {
                attempts,
                last: err,
            });
        }

        let wait = policy.delay_for(attempts, reset_after);
        if let Some(budget) = policy.max_elapsed {
            if started.elapsed().saturating_add(wait) > budget {
                return Err(RetryError::Exhausted {
                    attempts,
                    last: err,
                });
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
            _ = tokio::time::sleep(wait) => {},
        }
    }
}
