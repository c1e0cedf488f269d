//! Bounded linear-backoff retry for rate-limited embedding calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// How often, and how patiently, to retry a rate-limited embedding call.
///
/// The wait before attempt `n + 1` is `base_delay × n`, so the default
/// policy waits 2 s, then 4 s, and gives up after the third attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(2) }
    }
}

impl RetryPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `max_attempts` is zero.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(RagError::ConfigError("max_attempts must be at least 1".to_string()));
        }
        Ok(Self { max_attempts, base_delay })
    }

    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self { max_attempts: 1, base_delay: Duration::ZERO }
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay unit; the wait after attempt `n` is this times `n`.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Whether more than one attempt is allowed.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// The wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// An [`EmbeddingProvider`] decorator that retries rate-limited calls.
///
/// Only errors classified as [`ProviderErrorKind::RateLimited`](crate::ProviderErrorKind::RateLimited)
/// are retried; every other error is returned on the spot. When the budget
/// runs out the last rate-limit error becomes [`RagError::RateLimitExhausted`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use medchat_rag::{RetryPolicy, RetryingEmbeddingProvider};
///
/// let embedder = RetryingEmbeddingProvider::new(Arc::new(gemini), RetryPolicy::default());
/// let vector = embedder.embed("What is hypertension?").await?;
/// ```
pub struct RetryingEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    policy: RetryPolicy,
}

impl RetryingEmbeddingProvider {
    /// Wrap `inner` with the given policy.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The policy in effect.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl EmbeddingProvider for RetryingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut attempt = 1;
        loop {
            match self.inner.embed(text).await {
                Ok(values) => return Ok(values),
                Err(RagError::EmbeddingError { provider, kind, message }) if kind.is_rate_limit() => {
                    if attempt >= self.policy.max_attempts {
                        return Err(RagError::RateLimitExhausted {
                            provider,
                            attempts: attempt,
                            message,
                        });
                    }
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        provider = %provider,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "embedding rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
