//! # Retrying Transport
//!
//! Wraps a [`WebhookTransport`] with a per-attempt timeout, exponential
//! backoff and cooperative cancellation.
//!
//! ```text
//! attempt 1 ──fail(5xx/timeout/network)──▶ sleep(base)
//! attempt 2 ──fail──▶ sleep(min(base*2, max))
//! attempt 3 ──fail──▶ Err(last error)
//!
//! any point ──cancel──▶ Err(Cancelled), nothing further scheduled
//! ```
//!
//! Each attempt runs under its own child token of the caller's token. A
//! timeout cancels only that child; the caller's token is never touched here.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::types::{WebhookReply, WebhookRequest};
use super::webhook::{TransportError, WebhookTransport};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows the zero-based `attempt_index`:
    /// `min(base * 2^attempt_index, max)`. No jitter.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

pub struct RetryingTransport {
    inner: Arc<dyn WebhookTransport>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn WebhookTransport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs one logical exchange, retrying network failures, timeouts
    /// and 5xx responses within the attempt budget.
    ///
    /// Returns `Err(TransportError::Cancelled)` as soon as `cancel` fires,
    /// including when a reply raced past the cancellation.
    pub async fn execute(
        &self,
        request: &WebhookRequest,
        cancel: &CancellationToken,
    ) -> Result<WebhookReply, TransportError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!("Cancelled before attempt {}", attempt + 1);
                return Err(TransportError::Cancelled);
            }

            let attempt_token = cancel.child_token();
            let result = self.attempt(request, &attempt_token).await;
            attempt += 1;

            if cancel.is_cancelled() {
                info!("Request cancelled during attempt {}/{}", attempt, max_attempts);
                return Err(TransportError::Cancelled);
            }

            let err = match result {
                Ok(reply) => {
                    debug!("Attempt {}/{} succeeded via {}", attempt, max_attempts, self.inner.name());
                    return Ok(reply);
                }
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= max_attempts {
                warn!("Giving up after attempt {}/{}: {}", attempt, max_attempts, err);
                return Err(err);
            }

            let delay = self.policy.backoff(attempt - 1);
            warn!(
                "Attempt {}/{} failed: {}. Retrying in {}ms...",
                attempt,
                max_attempts,
                err,
                delay.as_millis()
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Request cancelled during backoff");
                    return Err(TransportError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One attempt bounded by the policy timeout. Dropping the inner future
    /// aborts the underlying call.
    async fn attempt(
        &self,
        request: &WebhookRequest,
        token: &CancellationToken,
    ) -> Result<WebhookReply, TransportError> {
        let timeout = self.policy.timeout;
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(TransportError::Cancelled),
            result = tokio::time::timeout(timeout, self.inner.send(request)) => match result {
                Ok(outcome) => outcome,
                Err(_) => {
                    token.cancel();
                    Err(TransportError::Timeout(timeout))
                }
            },
        }
    }
}
