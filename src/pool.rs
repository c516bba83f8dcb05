//! Pooled broker producer handles
//!
//! Broker sessions are expensive to establish and format-specific, so the
//! pool keys one long-lived handle per [`EmbeddedFormat`] and shares it
//! across every concurrent request. Creation is lazy and race-safe: even
//! under concurrent first use, exactly one handle per format is constructed.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::broker::{PartitionId, RecordSender, SenderFactory};
use crate::config::GatewayConfig;
use crate::error::RestGatewayError;
use crate::format::EmbeddedFormat;
use crate::metrics::global_metrics;
use crate::produce::{ProduceRecord, SendOutcome};

/// A pooled, reusable producer session bound to one embedded format.
///
/// Handles are owned by the pool; callers borrow them for the duration of a
/// send and never keep them past the pool's lifetime.
pub struct ProducerHandle {
    format: EmbeddedFormat,
    sender: Arc<dyn RecordSender>,
}

impl ProducerHandle {
    pub fn format(&self) -> EmbeddedFormat {
        self.format
    }
}

impl fmt::Debug for ProducerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerHandle")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Pool of producer handles shared across concurrent requests
pub struct ProducerPool {
    handles: DashMap<EmbeddedFormat, Arc<ProducerHandle>>,
    factory: Arc<dyn SenderFactory>,
    config: GatewayConfig,
    shut_down: AtomicBool,
}

impl ProducerPool {
    /// Create a new pool. No broker sessions are opened until the first
    /// acquire for a format.
    pub fn new(config: GatewayConfig, factory: Arc<dyn SenderFactory>) -> Self {
        Self {
            handles: DashMap::new(),
            factory,
            config,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the handle for `format`, creating it on first use.
    ///
    /// The same handle is returned for the same format for the life of the
    /// pool; the entry lock guarantees a single construction even when many
    /// request tasks race on first use.
    pub fn acquire(&self, format: EmbeddedFormat) -> Result<Arc<ProducerHandle>, RestGatewayError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(RestGatewayError::submission("producer pool is shut down"));
        }

        if let Some(handle) = self.handles.get(&format) {
            return Ok(Arc::clone(handle.value()));
        }

        match self.handles.entry(format) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let sender = self.factory.create(format).map_err(|e| {
                    RestGatewayError::submission(format!(
                        "failed to create {format} producer: {e}"
                    ))
                })?;
                info!(%format, "created producer handle");
                global_metrics().record_handle_created();

                let handle = Arc::new(ProducerHandle { format, sender });
                entry.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Dispatch one record send through `handle`.
    ///
    /// Returns immediately after handing the record to the client;
    /// `on_complete` receives the mapped outcome once the send resolves.
    /// Failures the client reports synchronously travel through the same
    /// completion path as network-level ones, so callers observe a single
    /// uniform channel.
    pub fn send<F>(
        &self,
        handle: &Arc<ProducerHandle>,
        topic: &str,
        partition: Option<PartitionId>,
        record: ProduceRecord,
        on_complete: F,
    ) -> Result<(), RestGatewayError>
    where
        F: FnOnce(SendOutcome) + Send + 'static,
    {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(RestGatewayError::submission("producer pool is shut down"));
        }

        let sender = Arc::clone(&handle.sender);
        let topic = topic.to_string();

        tokio::spawn(async move {
            let result = sender.async_send(&topic, partition, record.key, record.value).await;
            let outcome = SendOutcome::from_send(result);

            match &outcome {
                SendOutcome::Delivered { partition, offset, .. } => {
                    debug!(%topic, partition, offset, "record delivered");
                    global_metrics().record_delivered();
                }
                SendOutcome::Failed { kind, message } => {
                    debug!(%topic, ?kind, %message, "record send failed");
                    global_metrics().record_failed();
                }
            }

            on_complete(outcome);
        });

        Ok(())
    }

    /// Close and release every pooled handle. Idempotent; later acquires and
    /// sends fail with a submission error.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let handles: Vec<_> = self
            .handles
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.handles.clear();

        for handle in handles {
            handle.sender.close().await;
            info!(format = %handle.format, "closed producer handle");
        }

        info!("producer pool shut down");
    }
}

impl fmt::Debug for ProducerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerPool")
            .field("handles", &self.handles.len())
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
