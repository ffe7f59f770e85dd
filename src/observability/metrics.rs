//! Metrics collection for the Hack Hour client.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::resilience::QueueKind;

/// Metrics collector interface.
pub trait MetricsCollector: Send + Sync {
    /// Records a finished operation.
    fn record_request(&self, operation: &str, success: bool, duration: Duration);

    /// Records throttled attempts that were queued again.
    fn record_retries(&self, queue: QueueKind, retries: u32);

    /// Records an error.
    fn record_error(&self, error_type: &str);

    /// Gets current metrics.
    fn get_metrics(&self) -> RequestMetrics;

    /// Resets all metrics.
    fn reset(&self);
}

/// Request metrics snapshot.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    /// Total requests.
    pub total_requests: u64,
    /// Successful requests.
    pub successful_requests: u64,
    /// Failed requests.
    pub failed_requests: u64,
    /// Total latency in milliseconds, queue wait included.
    pub total_latency_ms: u64,
    /// Requests per operation.
    pub operations: HashMap<String, u64>,
    /// Retries per queue.
    pub retries: HashMap<String, u64>,
    /// Error counts by type.
    pub errors: HashMap<String, u64>,
}

impl RequestMetrics {
    /// Calculates average latency in milliseconds.
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.total_requests as f64
        }
    }

    /// Calculates success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }

    /// Total retries across both queues.
    pub fn total_retries(&self) -> u64 {
        self.retries.values().sum()
    }
}

/// Default metrics collector implementation.
pub struct DefaultMetricsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_ms: AtomicU64,
    operations: RwLock<HashMap<String, u64>>,
    retries: RwLock<HashMap<String, u64>>,
    errors: RwLock<HashMap<String, u64>>,
}

impl DefaultMetricsCollector {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            operations: RwLock::new(HashMap::new()),
            retries: RwLock::new(HashMap::new()),
            errors: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for DefaultMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for DefaultMetricsCollector {
    fn record_request(&self, operation: &str, success: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );

        *self
            .operations
            .write()
            .entry(operation.to_string())
            .or_insert(0) += 1;
    }

    fn record_retries(&self, queue: QueueKind, retries: u32) {
        *self
            .retries
            .write()
            .entry(queue.as_str().to_string())
            .or_insert(0) += u64::from(retries);
    }

    fn record_error(&self, error_type: &str) {
        *self
            .errors
            .write()
            .entry(error_type.to_string())
            .or_insert(0) += 1;
    }

    fn get_metrics(&self) -> RequestMetrics {
        RequestMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            total_latency_ms: self.total_latency_ms.load(Ordering::Relaxed),
            operations: self.operations.read().clone(),
            retries: self.retries.read().clone(),
            errors: self.errors.read().clone(),
        }
    }

    fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);
        self.operations.write().clear();
        self.retries.write().clear();
        self.errors.write().clear();
    }
}

impl std::fmt::Debug for DefaultMetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetricsCollector")
            .field("total_requests", &self.total_requests.load(Ordering::Relaxed))
            .field(
                "successful_requests",
                &self.successful_requests.load(Ordering::Relaxed),
            )
            .field("failed_requests", &self.failed_requests.load(Ordering::Relaxed))
            .finish()
    }
}

/// Metrics collector that discards everything.
#[derive(Debug, Default)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {
    fn record_request(&self, _operation: &str, _success: bool, _duration: Duration) {}

    fn record_retries(&self, _queue: QueueKind, _retries: u32) {}

    fn record_error(&self, _error_type: &str) {}

    fn get_metrics(&self) -> RequestMetrics {
        RequestMetrics::default()
    }

    fn reset(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("session", true, Duration::from_millis(100));
        collector.record_request("session", true, Duration::from_millis(200));
        collector.record_request("start", false, Duration::from_millis(50));

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.successful_requests, 2);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.total_latency_ms, 350);
        assert_eq!(metrics.operations.get("session"), Some(&2));
    }

    #[test]
    fn test_success_rate_and_latency() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("stats", true, Duration::from_millis(100));
        collector.record_request("stats", false, Duration::from_millis(200));

        let metrics = collector.get_metrics();
        assert!((metrics.success_rate() - 50.0).abs() < 0.1);
        assert!((metrics.average_latency_ms() - 150.0).abs() < 0.1);
    }

    #[test]
    fn test_retries_per_queue() {
        let collector = DefaultMetricsCollector::new();

        collector.record_retries(QueueKind::Reads, 2);
        collector.record_retries(QueueKind::Writes, 1);
        collector.record_retries(QueueKind::Reads, 1);

        let metrics = collector.get_metrics();
        assert_eq!(metrics.retries.get("reads"), Some(&3));
        assert_eq!(metrics.retries.get("writes"), Some(&1));
        assert_eq!(metrics.total_retries(), 4);
    }

    #[test]
    fn test_reset() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("ping", true, Duration::from_millis(100));
        collector.record_error("network");
        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_requests, 0);
        assert!(metrics.errors.is_empty());
    }
}
