//! Resilience layer for the Hack Hour client.
//!
//! Every request is admitted through one of two rate-limited queues (reads
//! for GET, writes for POST) and retried while the server answers 429 or 500.

mod rate_limiter;
mod retry;

pub use rate_limiter::{
    Budget, QueueKind, RateLimitData, RateLimitEvent, RateLimiter, RateLimiterConfig,
    LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER,
};
pub use retry::{RetryConfig, RetryPolicy};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::instrument;

use crate::config::HackHourConfig;
use crate::errors::{HackHourError, HackHourResult};
use crate::observability::MetricsCollector;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Configuration for the resilience orchestrator.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Read queue configuration.
    pub reads: RateLimiterConfig,
    /// Write queue configuration.
    pub writes: RateLimiterConfig,
    /// Retry configuration.
    pub retry: RetryConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            reads: RateLimiterConfig::new(crate::config::DEFAULT_READ_BUDGET),
            writes: RateLimiterConfig::new(crate::config::DEFAULT_WRITE_BUDGET),
            retry: RetryConfig::default(),
        }
    }
}

impl ResilienceConfig {
    /// Derives queue and retry settings from a client configuration.
    pub fn from_config(config: &HackHourConfig) -> Self {
        Self {
            reads: RateLimiterConfig::new(config.read_budget)
                .fallback_reset(config.fallback_reset),
            writes: RateLimiterConfig::new(config.write_budget)
                .fallback_reset(config.fallback_reset),
            retry: RetryConfig::new()
                .max_retries(config.max_retries)
                .delay(config.retry_delay),
        }
    }
}

/// Routes requests through the rate-limited queues with retries.
pub struct ResilienceOrchestrator {
    reads: RateLimiter,
    writes: RateLimiter,
    retry_policy: RetryPolicy,
    metrics: Arc<dyn MetricsCollector>,
}

impl ResilienceOrchestrator {
    /// Creates the orchestrator and starts both queue workers.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: ResilienceConfig, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self {
            reads: RateLimiter::new(QueueKind::Reads, config.reads),
            writes: RateLimiter::new(QueueKind::Writes, config.writes),
            retry_policy: RetryPolicy::new(config.retry),
            metrics,
        }
    }

    /// Limiter of the given queue.
    pub fn limiter(&self, kind: QueueKind) -> &RateLimiter {
        match kind {
            QueueKind::Reads => &self.reads,
            QueueKind::Writes => &self.writes,
        }
    }

    /// The read (GET) queue.
    pub fn reads(&self) -> &RateLimiter {
        &self.reads
    }

    /// The write (POST) queue.
    pub fn writes(&self) -> &RateLimiter {
        &self.writes
    }

    /// Sends `request` through its queue, retrying throttled responses.
    ///
    /// Each attempt is a separate queue entry, so a retry waits behind
    /// everything queued before it. The queue always receives the budget
    /// snapshot of each attempt, throttled ones included.
    #[instrument(
        skip(self, transport, request),
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn execute(
        &self,
        transport: &Arc<dyn HttpTransport>,
        request: HttpRequest,
    ) -> HackHourResult<HttpResponse> {
        let queue = QueueKind::for_method(request.method);
        let limiter = self.limiter(queue);
        let attempts = AtomicU32::new(0);

        let result = self
            .retry_policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                let transport = Arc::clone(transport);
                let request = request.clone();

                async move {
                    limiter
                        .run(move || async move {
                            match transport.send(request).await {
                                Ok(response) => {
                                    let snapshot = RateLimitData::from_response(&response);
                                    if snapshot.is_none() {
                                        tracing::debug!(
                                            status = response.status,
                                            "Response carried no rate limit headers"
                                        );
                                    }
                                    (Ok(response), snapshot)
                                }
                                Err(err) => (Err(err), None),
                            }
                        })
                        .await?
                        .map_err(HackHourError::from)
                }
            })
            .await;

        let retries = attempts.into_inner().saturating_sub(1);
        if retries > 0 {
            self.metrics.record_retries(queue, retries);
        }

        result
    }
}

impl std::fmt::Debug for ResilienceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceOrchestrator")
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}
