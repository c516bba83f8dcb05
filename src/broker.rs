//! Collaborator traits at the broker boundary
//!
//! The gateway never speaks a wire protocol itself. Everything it needs from
//! the cluster is expressed through the traits in this module: a metadata
//! query surface and a per-record asynchronous send primitive. Production
//! deployments back these with a real broker client; tests substitute fakes.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::format::EmbeddedFormat;

pub type TopicName = String;
pub type PartitionId = u32;
pub type Offset = u64;

/// Broker acknowledgment for one successfully appended record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordAck {
    pub partition: PartitionId,
    pub offset: Offset,
    /// Broker-assigned append timestamp, milliseconds since the epoch
    pub timestamp: u64,
}

/// Raw failure causes a broker client can report for a send or metadata call
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// The principal is not authorized for the topic
    #[error("Not authorized to access topic '{topic}'")]
    AuthorizationDenied { topic: String },

    /// The contacted broker no longer leads the partition
    #[error("Broker is not the leader for {topic}:{partition}")]
    NotLeaderForPartition {
        topic: String,
        partition: PartitionId,
    },

    /// Record exceeds the broker's configured maximum
    #[error("Record size {size} exceeds maximum {max_size}")]
    RecordTooLarge { size: usize, max_size: usize },

    /// The client's own request timeout elapsed
    #[error("Send timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The record could not be serialized before the network hop
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Transport-level failure reaching the cluster
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Anything the closed taxonomy cannot name
    #[error("{message}")]
    Unknown { message: String },
}

impl BrokerError {
    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new unknown error
    pub fn unknown<S: Into<String>>(message: S) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Check if a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotLeaderForPartition { .. } | Self::Timeout { .. } | Self::Connection { .. }
        )
    }
}

/// Asynchronous per-record send primitive of the underlying broker client.
///
/// Implementations must tolerate concurrent `async_send` calls on the same
/// instance; the pool does not serialize access to a handle. Internal
/// batching and buffering policy is the client's own.
#[async_trait]
pub trait RecordSender: Send + Sync {
    /// Submit one record and resolve to its acknowledgment coordinates or
    /// the terminal failure cause.
    async fn async_send(
        &self,
        topic: &str,
        partition: Option<PartitionId>,
        key: Option<Bytes>,
        value: Option<Bytes>,
    ) -> Result<RecordAck, BrokerError>;

    /// Flush and release client resources
    async fn close(&self) {}
}

/// Creates format-specific sender sessions for the producer pool.
///
/// Raw-bytes and structured payloads require differently configured clients,
/// so the pool asks the factory once per [`EmbeddedFormat`].
pub trait SenderFactory: Send + Sync {
    fn create(&self, format: EmbeddedFormat) -> Result<Arc<dyn RecordSender>, BrokerError>;
}

/// Cluster metadata queries consumed by the admin metadata gate
#[async_trait]
pub trait ClusterMetadata: Send + Sync {
    async fn topic_exists(&self, topic: &str) -> Result<bool, BrokerError>;

    async fn partition_exists(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<bool, BrokerError>;
}
