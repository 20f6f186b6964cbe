//! Bounded retry with per-attempt timeout and exponential backoff.
//!
//! [`RetryExecutor`] runs an arbitrary async operation up to `retries` times.
//! Each attempt is raced against the configured timeout; failed attempts are
//! followed by a backoff of `min(1s * 2^attempt, 10s)` except after the last.
//!
//! A timed-out attempt is dropped, which cancels it at its next await point.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Base delay for the first backoff.
const BACKOFF_BASE_MS: u64 = 1_000;

/// Upper bound for any single backoff.
const BACKOFF_CAP_MS: u64 = 10_000;

/// Configuration for [`RetryExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Timeout for a single attempt, in milliseconds.
    pub timeout_ms: u64,

    /// Maximum number of attempts.
    pub retries: u32,

    /// Log every attempt at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            retries: 3,
            verbose: false,
        }
    }
}

impl ExecutorConfig {
    /// Per-attempt timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load executor settings from environment variables.
    ///
    /// Reads `MCP_EXEC_TIMEOUT_MS`, `MCP_EXEC_RETRIES` and `MCP_EXEC_VERBOSE`;
    /// unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(timeout_ms) = std::env::var("MCP_EXEC_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout_ms = timeout_ms;
        }

        if let Some(retries) = std::env::var("MCP_EXEC_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.retries = retries;
        }

        if let Ok(verbose) = std::env::var("MCP_EXEC_VERBOSE") {
            config.verbose = matches!(verbose.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }
}

/// Errors returned by [`RetryExecutor::execute`].
#[derive(Debug, Error, PartialEq)]
pub enum RetryError<E> {
    /// The last attempt did not finish in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The last attempt failed with the operation's own error.
    #[error("{0}")]
    Failed(E),

    /// No attempt was made (zero retries configured).
    #[error("Execution failed")]
    Exhausted,
}

/// Delay before the retry that follows attempt `attempt` (zero-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_CAP_MS))
}

/// Runs operations with timeout, retries and backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: ExecutorConfig,
}

impl RetryExecutor {
    /// Create an executor with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// The operation's output is passed through untouched. On failure the
    /// last observed error is returned.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let timeout = self.config.timeout();
        let mut last_error = None;

        for attempt in 0..self.config.retries {
            self.log_attempt(attempt);

            let error = match tokio::time::timeout(timeout, operation()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => RetryError::Failed(e),
                Err(_) => RetryError::Timeout(timeout),
            };
            warn!(
                "Attempt {}/{} failed: {}",
                attempt + 1,
                self.config.retries,
                error
            );
            last_error = Some(error);

            if attempt + 1 < self.config.retries {
                let delay = backoff_delay(attempt);
                debug!("Retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or(RetryError::Exhausted))
    }

    fn log_attempt(&self, attempt: u32) {
        if self.config.verbose {
            info!("Attempt {}/{}", attempt + 1, self.config.retries);
        } else {
            debug!("Attempt {}/{}", attempt + 1, self.config.retries);
        }
    }
}
