//! Error types for the REST produce gateway

use crate::broker::BrokerError;

/// Main error type for gateway operations.
///
/// The variants split along the lines the HTTP layer cares about: rejections
/// the client caused (`Validation`, `TopicNotFound`, `PartitionNotFound`),
/// metadata queries that could not be answered at all (`Infrastructure`), and
/// batches that passed validation but could not be dispatched (`Submission`).
/// Per-record failures never appear here; they are embedded in the batch
/// result as [`crate::produce::SendOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum RestGatewayError {
    /// Malformed batch structure or payload; zero sends were attempted
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Topic does not exist
    #[error("Topic '{topic}' does not exist")]
    TopicNotFound { topic: String },

    /// Partition does not exist
    #[error("Partition {partition} does not exist for topic '{topic}'")]
    PartitionNotFound { topic: String, partition: u32 },

    /// Cluster metadata could not be answered; not the client's fault
    #[error("Infrastructure error: {message}")]
    Infrastructure { message: String },

    /// The batch as a whole could not be dispatched
    #[error("Submission error: {message}")]
    Submission { message: String },
}

impl RestGatewayError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new infrastructure error
    pub fn infrastructure<S: Into<String>>(message: S) -> Self {
        Self::Infrastructure {
            message: message.into(),
        }
    }

    /// Create a new submission error
    pub fn submission<S: Into<String>>(message: S) -> Self {
        Self::Submission {
            message: message.into(),
        }
    }

    /// Check if this error is a client-side rejection
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::TopicNotFound { .. } | Self::PartitionNotFound { .. }
        )
    }
}

/// Closed classification of per-record send failures.
///
/// Every terminal cause a broker client can report collapses into one of
/// these kinds; each carries a fixed outward-facing code in the response
/// body. A batch may mix `Delivered` and `Failed` outcomes freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProduceErrorKind {
    AuthorizationDenied,
    NotLeaderForPartition,
    RecordTooLarge,
    Timeout,
    Serialization,
    Unknown,
}

impl ProduceErrorKind {
    /// Outward-facing numeric error code carried in the response body
    pub fn code(self) -> i32 {
        match self {
            Self::AuthorizationDenied => 40301,
            Self::Serialization => 42205,
            Self::RecordTooLarge => 50002,
            Self::Unknown => 50002,
            Self::NotLeaderForPartition => 50003,
            Self::Timeout => 50003,
        }
    }

    /// Check if the failure is worth retrying on the client side
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NotLeaderForPartition | Self::Timeout)
    }
}

impl From<&BrokerError> for ProduceErrorKind {
    fn from(err: &BrokerError) -> Self {
        match err {
            BrokerError::AuthorizationDenied { .. } => Self::AuthorizationDenied,
            BrokerError::NotLeaderForPartition { .. } => Self::NotLeaderForPartition,
            BrokerError::RecordTooLarge { .. } => Self::RecordTooLarge,
            BrokerError::Timeout { .. } => Self::Timeout,
            BrokerError::Serialization { .. } => Self::Serialization,
            BrokerError::Connection { .. } | BrokerError::Unknown { .. } => Self::Unknown,
        }
    }
}
