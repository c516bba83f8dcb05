//! Gateway facade the HTTP resource layer drives
//!
//! Wires the admin metadata gate, the producer pool, and the orchestrator
//! into the single entry point a produce resource calls after decoding the
//! request body.

use std::sync::Arc;
use tokio::sync::oneshot;

use crate::broker::{ClusterMetadata, SenderFactory};
use crate::config::GatewayConfig;
use crate::error::RestGatewayError;
use crate::metadata::MetadataGate;
use crate::pool::ProducerPool;
use crate::produce::{BatchResult, ProduceBatch, ProduceOrchestrator};

/// REST produce gateway
pub struct RestGateway {
    gate: MetadataGate,
    pool: Arc<ProducerPool>,
    orchestrator: ProduceOrchestrator,
}

impl RestGateway {
    pub fn new(
        config: GatewayConfig,
        metadata: Arc<dyn ClusterMetadata>,
        factory: Arc<dyn SenderFactory>,
    ) -> Self {
        let pool = Arc::new(ProducerPool::new(config, factory));

        Self {
            gate: MetadataGate::new(metadata),
            orchestrator: ProduceOrchestrator::new(Arc::clone(&pool)),
            pool,
        }
    }

    /// Validate existence, then hand the batch to the orchestrator.
    ///
    /// Metadata rejections (unknown topic or partition, unanswerable
    /// cluster) return `Err` here with zero pool interaction. Past the
    /// gate, `Ok(())` is returned after dispatch and the batch's fate is
    /// delivered through `on_complete`, exactly once.
    pub async fn produce<F>(
        &self,
        batch: ProduceBatch,
        on_complete: F,
    ) -> Result<(), RestGatewayError>
    where
        F: FnOnce(Result<BatchResult, RestGatewayError>) + Send + 'static,
    {
        self.gate.ensure_topic(&batch.topic).await?;
        if let Some(partition) = batch.partition {
            self.gate.ensure_partition(&batch.topic, partition).await?;
        }

        self.orchestrator.submit(batch, on_complete);
        Ok(())
    }

    /// Produce and await the assembled result.
    ///
    /// Convenience for resource layers that suspend the request until the
    /// batch resolves.
    pub async fn produce_awaiting(
        &self,
        batch: ProduceBatch,
    ) -> Result<BatchResult, RestGatewayError> {
        let (tx, rx) = oneshot::channel();

        self.produce(batch, move |result| {
            let _ = tx.send(result);
        })
        .await?;

        rx.await
            .map_err(|_| RestGatewayError::submission("produce completion dropped"))?
    }

    pub fn pool(&self) -> &Arc<ProducerPool> {
        &self.pool
    }

    /// Release all pooled broker sessions. Call exactly once at teardown.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
