//! Observability module for the Hack Hour client.
//!
//! Request metrics, subscriber setup, and a timer for per-operation latency.

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use metrics::{DefaultMetricsCollector, MetricsCollector, NoopMetricsCollector, RequestMetrics};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::HackHourResult;

/// Times one public operation and records its outcome.
#[derive(Debug)]
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Starts timing `operation`.
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Records `result` against `metrics` and passes it through.
    pub fn finish<T>(
        self,
        metrics: &Arc<dyn MetricsCollector>,
        result: HackHourResult<T>,
    ) -> HackHourResult<T> {
        let elapsed = self.elapsed();
        match &result {
            Ok(_) => metrics.record_request(self.operation, true, elapsed),
            Err(err) => {
                tracing::debug!(operation = self.operation, error = %err, "Operation failed");
                metrics.record_request(self.operation, false, elapsed);
                metrics.record_error(err.kind());
            }
        }
        result
    }

    /// Time since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the operation name.
    pub fn operation(&self) -> &str {
        self.operation
    }
}
