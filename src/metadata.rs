//! Existence checks against broker cluster metadata
//!
//! The single call-site consulted before a batch is committed to the pool,
//! so that unknown topics and partitions surface as client-facing not-found
//! rejections instead of opaque send failures.

use std::sync::Arc;

use crate::broker::{ClusterMetadata, PartitionId};
use crate::error::RestGatewayError;

/// Admin metadata gate over a [`ClusterMetadata`] collaborator
pub struct MetadataGate {
    inner: Arc<dyn ClusterMetadata>,
}

impl MetadataGate {
    pub fn new(inner: Arc<dyn ClusterMetadata>) -> Self {
        Self { inner }
    }

    /// `Ok(())` iff the topic exists. An unanswerable metadata query is an
    /// infrastructure error, distinct from not-found.
    pub async fn ensure_topic(&self, topic: &str) -> Result<(), RestGatewayError> {
        match self.inner.topic_exists(topic).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RestGatewayError::TopicNotFound {
                topic: topic.to_string(),
            }),
            Err(err) => Err(RestGatewayError::infrastructure(format!(
                "metadata query failed for topic '{topic}': {err}"
            ))),
        }
    }

    /// `Ok(())` iff the partition exists for the topic
    pub async fn ensure_partition(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<(), RestGatewayError> {
        match self.inner.partition_exists(topic, partition).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RestGatewayError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            }),
            Err(err) => Err(RestGatewayError::infrastructure(format!(
                "metadata query failed for {topic}:{partition}: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerError;
    use async_trait::async_trait;

    struct StaticMetadata {
        topic: &'static str,
        partitions: PartitionId,
        unreachable: bool,
    }

    #[async_trait]
    impl ClusterMetadata for StaticMetadata {
        async fn topic_exists(&self, topic: &str) -> Result<bool, BrokerError> {
            if self.unreachable {
                return Err(BrokerError::connection("cluster unreachable"));
            }
            Ok(topic == self.topic)
        }

        async fn partition_exists(
            &self,
            topic: &str,
            partition: PartitionId,
        ) -> Result<bool, BrokerError> {
            if self.unreachable {
                return Err(BrokerError::connection("cluster unreachable"));
            }
            Ok(topic == self.topic && partition < self.partitions)
        }
    }

    fn gate(unreachable: bool) -> MetadataGate {
        MetadataGate::new(Arc::new(StaticMetadata {
            topic: "orders",
            partitions: 3,
            unreachable,
        }))
    }

    #[tokio::test]
    async fn test_existing_topic_and_partition_pass() {
        let gate = gate(false);
        gate.ensure_topic("orders").await.unwrap();
        gate.ensure_partition("orders", 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_topic_is_not_found() {
        let err = gate(false).ensure_topic("unknown").await.unwrap_err();
        assert!(matches!(err, RestGatewayError::TopicNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_partition_is_not_found() {
        let err = gate(false).ensure_partition("orders", 9).await.unwrap_err();
        assert!(matches!(
            err,
            RestGatewayError::PartitionNotFound { partition: 9, .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_cluster_is_infrastructure() {
        let gate = gate(true);
        let err = gate.ensure_topic("orders").await.unwrap_err();
        assert!(matches!(err, RestGatewayError::Infrastructure { .. }));

        let err = gate.ensure_partition("orders", 0).await.unwrap_err();
        assert!(matches!(err, RestGatewayError::Infrastructure { .. }));
    }
}
