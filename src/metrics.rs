//! Metrics collection for the REST produce gateway

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Gateway metrics collector
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    pub batches_submitted: AtomicU64,
    pub batches_completed: AtomicU64,
    pub batches_rejected: AtomicU64,
    pub submission_errors: AtomicU64,
    pub records_delivered: AtomicU64,
    pub records_failed: AtomicU64,
    pub handles_created: AtomicU64,
}

impl GatewayMetrics {
    /// Record a batch handed to the pool
    pub fn record_batch_submitted(&self) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch whose completion callback fired with a result
    pub fn record_batch_completed(&self) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch rejected before any send
    pub fn record_batch_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a whole-batch dispatch failure
    pub fn record_submission_error(&self) {
        self.submission_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one broker-acknowledged record
    pub fn record_delivered(&self) {
        self.records_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one failed record send
    pub fn record_failed(&self) {
        self.records_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a producer handle construction
    pub fn record_handle_created(&self) {
        self.handles_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_submitted: self.batches_submitted.load(Ordering::Relaxed),
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            submission_errors: self.submission_errors.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
            handles_created: self.handles_created.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub batches_submitted: u64,
    pub batches_completed: u64,
    pub batches_rejected: u64,
    pub submission_errors: u64,
    pub records_delivered: u64,
    pub records_failed: u64,
    pub handles_created: u64,
}

/// Global metrics instance
static GLOBAL_METRICS: once_cell::sync::Lazy<Arc<GatewayMetrics>> =
    once_cell::sync::Lazy::new(|| Arc::new(GatewayMetrics::default()));

/// Get the global metrics instance
pub fn global_metrics() -> Arc<GatewayMetrics> {
    GLOBAL_METRICS.clone()
}
