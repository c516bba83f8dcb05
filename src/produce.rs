//! Produce data model and batch orchestration
//!
//! [`ProduceOrchestrator::submit`] turns one validated batch into N
//! independent sends through the producer pool, then assembles their
//! completions into a single [`BatchResult`] whose position `i` always
//! corresponds to input record `i`, no matter which order the broker
//! acknowledges them in. Completion delivery is single-shot: the callback
//! fires exactly once per submitted batch.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::broker::{BrokerError, Offset, PartitionId, RecordAck};
use crate::error::{ProduceErrorKind, RestGatewayError};
use crate::format::EmbeddedFormat;
use crate::metrics::global_metrics;
use crate::pool::ProducerPool;

/// One message to publish. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceRecord {
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    /// Explicit target partition; must be absent when the batch itself
    /// targets a fixed partition
    pub partition: Option<PartitionId>,
}

impl ProduceRecord {
    pub fn new(key: Option<Bytes>, value: Option<Bytes>) -> Self {
        Self {
            key,
            value,
            partition: None,
        }
    }

    pub fn with_partition(mut self, partition: PartitionId) -> Self {
        self.partition = Some(partition);
        self
    }

    fn value_len(&self) -> usize {
        self.value.as_ref().map(|v| v.len()).unwrap_or(0)
    }
}

/// An ordered group of records submitted together, bound to one topic
#[derive(Debug, Clone)]
pub struct ProduceBatch {
    pub topic: String,
    /// Fixed target partition for partition-scoped submissions
    pub partition: Option<PartitionId>,
    pub format: EmbeddedFormat,
    pub records: Vec<ProduceRecord>,
}

impl ProduceBatch {
    /// Create a new batch builder
    pub fn builder() -> ProduceBatchBuilder {
        ProduceBatchBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check the batch's structural invariants.
    ///
    /// A partition-scoped batch must not also carry per-record partitions,
    /// and no record value may exceed `max_message_size`. Violations fail
    /// the whole batch before any send is attempted.
    pub fn validate(&self, max_message_size: usize) -> Result<(), RestGatewayError> {
        if let Some(fixed) = self.partition {
            if let Some(index) = self.records.iter().position(|r| r.partition.is_some()) {
                return Err(RestGatewayError::validation(format!(
                    "record {index} specifies a partition but the batch already targets partition {fixed}"
                )));
            }
        }

        for (index, record) in self.records.iter().enumerate() {
            let size = record.value_len();
            if size > max_message_size {
                return Err(RestGatewayError::validation(format!(
                    "record {index} value size {size} exceeds maximum {max_message_size}"
                )));
            }
        }

        Ok(())
    }
}

/// Builder for ProduceBatch
#[derive(Debug)]
pub struct ProduceBatchBuilder {
    topic: Option<String>,
    partition: Option<PartitionId>,
    format: EmbeddedFormat,
    records: Vec<ProduceRecord>,
}

impl ProduceBatchBuilder {
    pub fn new() -> Self {
        Self {
            topic: None,
            partition: None,
            format: EmbeddedFormat::Binary,
            records: Vec::new(),
        }
    }

    pub fn topic<S: Into<String>>(mut self, topic: S) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn format(mut self, format: EmbeddedFormat) -> Self {
        self.format = format;
        self
    }

    pub fn record(mut self, record: ProduceRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn records<I: IntoIterator<Item = ProduceRecord>>(mut self, records: I) -> Self {
        self.records.extend(records);
        self
    }

    pub fn build(self) -> ProduceBatch {
        let topic = self.topic.expect("Topic is required");

        ProduceBatch {
            topic,
            partition: self.partition,
            format: self.format,
            records: self.records,
        }
    }
}

impl Default for ProduceBatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal result of one record's send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The broker acknowledged the record at these coordinates
    Delivered {
        partition: PartitionId,
        offset: Offset,
        timestamp: u64,
    },
    /// The send failed with a classified cause
    Failed {
        kind: ProduceErrorKind,
        message: String,
    },
}

impl SendOutcome {
    pub fn from_ack(ack: RecordAck) -> Self {
        Self::Delivered {
            partition: ack.partition,
            offset: ack.offset,
            timestamp: ack.timestamp,
        }
    }

    pub fn from_cause(err: &BrokerError) -> Self {
        Self::Failed {
            kind: ProduceErrorKind::from(err),
            message: err.to_string(),
        }
    }

    /// Map a raw send result into an outcome
    pub fn from_send(result: Result<RecordAck, BrokerError>) -> Self {
        match result {
            Ok(ack) => Self::from_ack(ack),
            Err(err) => Self::from_cause(&err),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn failed_with(&self, kind: ProduceErrorKind) -> bool {
        matches!(self, Self::Failed { kind: k, .. } if *k == kind)
    }
}

/// Ordered per-record outcomes, index-aligned with the submitted batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchResult(Vec<SendOutcome>);

impl BatchResult {
    pub fn outcomes(&self) -> &[SendOutcome] {
        &self.0
    }

    pub fn into_outcomes(self) -> Vec<SendOutcome> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff the batch is non-empty and every outcome failed with `kind`
    pub fn all_failed_with(&self, kind: ProduceErrorKind) -> bool {
        !self.0.is_empty() && self.0.iter().all(|o| o.failed_with(kind))
    }
}

impl From<Vec<SendOutcome>> for BatchResult {
    fn from(outcomes: Vec<SendOutcome>) -> Self {
        Self(outcomes)
    }
}

impl std::ops::Index<usize> for BatchResult {
    type Output = SendOutcome;

    fn index(&self, index: usize) -> &SendOutcome {
        &self.0[index]
    }
}

/// Completion callback invoked exactly once per submitted batch
pub type BatchCallback = Box<dyn FnOnce(Result<BatchResult, RestGatewayError>) + Send + 'static>;

/// In-flight bookkeeping for one submitted batch.
///
/// One write-once slot per record index, an outstanding-send countdown, and
/// a take-once callback. Slot writes at different indices never contend;
/// the callback can only fire when the countdown reaches zero or the batch
/// is aborted, whichever happens first.
pub(crate) struct PendingBatch {
    slots: Vec<OnceLock<SendOutcome>>,
    outstanding: AtomicUsize,
    on_complete: Mutex<Option<BatchCallback>>,
}

impl PendingBatch {
    pub(crate) fn new(size: usize, on_complete: BatchCallback) -> Arc<Self> {
        Arc::new(Self {
            slots: (0..size).map(|_| OnceLock::new()).collect(),
            outstanding: AtomicUsize::new(size),
            on_complete: Mutex::new(Some(on_complete)),
        })
    }

    /// Record the outcome for slot `index`; fires the callback when the last
    /// outstanding send resolves.
    pub(crate) fn complete(&self, index: usize, outcome: SendOutcome) {
        if self.slots[index].set(outcome).is_err() {
            warn!(index, "duplicate completion for produce slot");
            return;
        }

        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.fire();
        }
    }

    /// Deliver a whole-batch failure. Sends already dispatched still fill
    /// their slots when they resolve, but can no longer fire the callback.
    pub(crate) fn abort(&self, err: RestGatewayError) {
        if let Some(on_complete) = self.on_complete.lock().take() {
            on_complete(Err(err));
        }
    }

    fn fire(&self) {
        let Some(on_complete) = self.on_complete.lock().take() else {
            return;
        };

        let outcomes: Vec<SendOutcome> = self
            .slots
            .iter()
            .map(|slot| {
                slot.get().cloned().unwrap_or_else(|| SendOutcome::Failed {
                    kind: ProduceErrorKind::Unknown,
                    message: "send completion lost".to_string(),
                })
            })
            .collect();

        global_metrics().record_batch_completed();
        on_complete(Ok(BatchResult::from(outcomes)));
    }
}

/// Fans one batch out through the producer pool and assembles the ordered
/// result
pub struct ProduceOrchestrator {
    pool: Arc<ProducerPool>,
}

impl ProduceOrchestrator {
    pub fn new(pool: Arc<ProducerPool>) -> Self {
        Self { pool }
    }

    /// Submit a batch for production.
    ///
    /// Returns after dispatch without waiting for broker acknowledgment.
    /// `on_complete` receives either the index-aligned [`BatchResult`] or a
    /// single whole-batch error, exactly once: a structural violation or an
    /// empty batch resolves on the calling thread, everything else on a
    /// client completion thread. Once dispatched, every record runs to
    /// completion; there is no mid-flight cancellation.
    pub fn submit<F>(&self, batch: ProduceBatch, on_complete: F)
    where
        F: FnOnce(Result<BatchResult, RestGatewayError>) + Send + 'static,
    {
        let on_complete: BatchCallback = Box::new(on_complete);

        if let Err(err) = batch.validate(self.pool.config().max_message_size) {
            debug!(topic = %batch.topic, %err, "rejected produce batch");
            global_metrics().record_batch_rejected();
            on_complete(Err(err));
            return;
        }

        if batch.is_empty() {
            on_complete(Ok(BatchResult::default()));
            return;
        }

        let handle = match self.pool.acquire(batch.format) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(topic = %batch.topic, %err, "could not acquire producer handle");
                global_metrics().record_submission_error();
                on_complete(Err(err));
                return;
            }
        };

        global_metrics().record_batch_submitted();
        let pending = PendingBatch::new(batch.len(), on_complete);
        let fixed_partition = batch.partition;

        for (index, record) in batch.records.into_iter().enumerate() {
            let partition = record.partition.or(fixed_partition);
            let slot = Arc::clone(&pending);

            let dispatched = self
                .pool
                .send(&handle, &batch.topic, partition, record, move |outcome| {
                    slot.complete(index, outcome);
                });

            if let Err(err) = dispatched {
                warn!(topic = %batch.topic, index, %err, "batch dispatch failed");
                global_metrics().record_submission_error();
                pending.abort(err);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn delivered(offset: Offset) -> SendOutcome {
        SendOutcome::Delivered {
            partition: 0,
            offset,
            timestamp: 1000 + offset,
        }
    }

    fn denied() -> SendOutcome {
        SendOutcome::Failed {
            kind: ProduceErrorKind::AuthorizationDenied,
            message: "Not authorized to access topic 't'".to_string(),
        }
    }

    #[test]
    fn test_batch_builder() {
        let batch = ProduceBatch::builder()
            .topic("orders")
            .partition(2)
            .format(EmbeddedFormat::Json)
            .record(ProduceRecord::new(None, Some(Bytes::from_static(b"v"))))
            .build();

        assert_eq!(batch.topic, "orders");
        assert_eq!(batch.partition, Some(2));
        assert_eq!(batch.format, EmbeddedFormat::Json);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_validate_rejects_conflicting_partitions() {
        let batch = ProduceBatch::builder()
            .topic("orders")
            .partition(0)
            .record(
                ProduceRecord::new(None, Some(Bytes::from_static(b"v"))).with_partition(1),
            )
            .build();

        let err = batch.validate(1024).unwrap_err();
        assert!(matches!(err, RestGatewayError::Validation { .. }));
    }

    #[test]
    fn test_validate_allows_per_record_partitions_for_topic_scope() {
        let batch = ProduceBatch::builder()
            .topic("orders")
            .record(
                ProduceRecord::new(None, Some(Bytes::from_static(b"v"))).with_partition(1),
            )
            .build();

        assert!(batch.validate(1024).is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_value() {
        let batch = ProduceBatch::builder()
            .topic("orders")
            .record(ProduceRecord::new(None, Some(Bytes::from(vec![0u8; 32]))))
            .build();

        let err = batch.validate(16).unwrap_err();
        assert!(matches!(err, RestGatewayError::Validation { .. }));
    }

    #[test]
    fn test_outcome_mapping() {
        let ack = RecordAck {
            partition: 3,
            offset: 42,
            timestamp: 99,
        };
        assert_eq!(
            SendOutcome::from_send(Ok(ack)),
            SendOutcome::Delivered {
                partition: 3,
                offset: 42,
                timestamp: 99,
            }
        );

        let outcome = SendOutcome::from_send(Err(BrokerError::timeout(100)));
        assert!(outcome.failed_with(ProduceErrorKind::Timeout));
    }

    #[test]
    fn test_all_failed_with() {
        assert!(!BatchResult::default().all_failed_with(ProduceErrorKind::AuthorizationDenied));

        let mixed = BatchResult::from(vec![denied(), delivered(0)]);
        assert!(!mixed.all_failed_with(ProduceErrorKind::AuthorizationDenied));

        let all = BatchResult::from(vec![denied(), denied()]);
        assert!(all.all_failed_with(ProduceErrorKind::AuthorizationDenied));
    }

    #[test]
    fn test_pending_batch_orders_out_of_order_completions() {
        let result = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&result);
        let pending = PendingBatch::new(
            3,
            Box::new(move |r| {
                *sink.lock() = Some(r);
            }),
        );

        pending.complete(2, delivered(2));
        assert!(result.lock().is_none());
        pending.complete(0, delivered(0));
        assert!(result.lock().is_none());
        pending.complete(1, delivered(1));

        let batch = result.lock().take().unwrap().unwrap();
        assert_eq!(batch.len(), 3);
        for i in 0..3 {
            assert_eq!(batch[i], delivered(i as Offset));
        }
    }

    #[test]
    fn test_pending_batch_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&fired);
        let pending = PendingBatch::new(
            1,
            Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }),
        );

        pending.complete(0, delivered(0));
        // a duplicate completion must not fire again
        pending.complete(0, delivered(7));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_abort_suppresses_late_completions() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let pending = PendingBatch::new(
            2,
            Box::new(move |r| {
                sink.lock().push(r.is_ok());
            }),
        );

        pending.complete(0, delivered(0));
        pending.abort(RestGatewayError::submission("pool shut down"));
        pending.complete(1, delivered(1));

        let calls = calls.lock();
        assert_eq!(calls.as_slice(), &[false]);
    }
}
