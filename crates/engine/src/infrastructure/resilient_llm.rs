//! Retry wrapper for the narrator model.
//!
//! Local model servers drop requests while loading weights or under load, so
//! transient failures are retried with exponential backoff and jitter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay added or removed at random, 0.0..=1.0.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    fn backoff_ms(&self, retry: u32) -> u64 {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    /// Backoff for `retry` with `unit` in `[-1, 1]` scaling the jitter.
    fn delay_ms(&self, retry: u32, unit: f64) -> u64 {
        let backoff = self.backoff_ms(retry) as f64;
        let jitter = backoff * self.jitter_factor * unit.clamp(-1.0, 1.0);
        (backoff + jitter).max(0.0).round() as u64
    }
}

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn jittered_delay(&self, retry: u32) -> Duration {
        let unit = if self.config.jitter_factor > 0.0 {
            rand::thread_rng().gen_range(-1.0..=1.0)
        } else {
            0.0
        };
        Duration::from_millis(self.config.delay_ms(retry, unit))
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut retry = 0;
        loop {
            let error = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if retry > 0 {
                        tracing::info!(retries = retry, "Narrator model answered after retrying");
                    }
                    return Ok(response);
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                tracing::error!(error = %error, "Narrator model request rejected");
                return Err(error);
            }
            if retry >= self.config.max_retries {
                tracing::error!(
                    attempts = retry + 1,
                    error = %error,
                    "Narrator model unavailable after retries"
                );
                return Err(error);
            }

            retry += 1;
            let delay = self.jittered_delay(retry);
            tracing::warn!(
                retry,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Narrator model request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
