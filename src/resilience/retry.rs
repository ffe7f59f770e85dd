//! Retry policy for throttled responses.
//!
//! A response with a retryable status (429, 500) is never surfaced to the
//! caller; the same request goes back to the tail of its queue until the
//! server answers with something else or the retry bound is reached.

use http::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::instrument;

use crate::errors::{HackHourError, HackHourResult};
use crate::transport::HttpResponse;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries; `None` retries until the request goes through.
    pub max_retries: Option<u32>,
    /// Pause before a throttled request is queued again.
    pub delay: Duration,
    /// Whether to add up to 25% random jitter to the pause.
    pub jitter: bool,
    /// Statuses that trigger a retry.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(10),
            delay: Duration::from_millis(250),
            jitter: true,
            retry_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS.as_u16(),
                StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ],
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, retries: Option<u32>) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the pause between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets whether to use jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Retry policy over HTTP responses.
#[derive(Debug, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns true if a response with this status is retried.
    pub fn is_retryable(&self, status: u16) -> bool {
        self.config.retry_statuses.contains(&status)
    }

    /// Runs `attempt` until it yields a non-retryable response.
    ///
    /// Errors from `attempt` are returned as-is without retrying.
    #[instrument(skip(self, attempt), fields(max_retries = ?self.config.max_retries))]
    pub async fn execute<F, Fut>(&self, attempt: F) -> HackHourResult<HttpResponse>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = HackHourResult<HttpResponse>>,
    {
        let mut retries: u32 = 0;

        loop {
            let response = attempt().await?;
            if !self.is_retryable(response.status) {
                return Ok(response);
            }

            if self.config.max_retries.is_some_and(|max| retries >= max) {
                tracing::warn!(
                    status = response.status,
                    attempts = retries + 1,
                    "Giving up on throttled request"
                );
                return Err(HackHourError::RateLimited {
                    status: response.status,
                    attempts: retries + 1,
                });
            }

            let delay = self.calculate_delay();
            retries += 1;

            tracing::info!(
                status = response.status,
                retry = retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Request throttled; queueing again"
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    fn calculate_delay(&self) -> Duration {
        if self.config.jitter && !self.config.delay.is_zero() {
            self.config
                .delay
                .mul_f64(1.0 + rand::random::<f64>() * 0.25)
        } else {
            self.config.delay
        }
    }
}
