//! # FluxMQ REST Gateway
//!
//! A REST produce gateway for FluxMQ and Kafka-compatible message brokers:
//! HTTP clients publish records without speaking the broker's wire protocol.
//!
//! ## Features
//!
//! - **Ordered batch results**: one request with N records yields one
//!   response with N outcomes, position-aligned regardless of broker
//!   acknowledgment order
//! - **Connection amortization**: long-lived producer handles pooled per
//!   embedded format and shared across unrelated requests
//! - **Per-record outcome fidelity**: delivered coordinates and classified
//!   failures mix freely in one success-class response; only whole-batch
//!   failures escalate to an error status
//! - **Pluggable broker boundary**: the send primitive and metadata queries
//!   are trait seams, substitutable in tests without a mocking framework
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fluxmq_rest::{GatewayConfig, ProduceBatch, ProduceRecord, RestGateway};
//!
//! #[tokio::main]
//! async fn main() -> fluxmq_rest::Result<()> {
//!     let gateway = RestGateway::new(GatewayConfig::default(), metadata, factory);
//!
//!     let batch = ProduceBatch::builder()
//!         .topic("orders")
//!         .partition(0)
//!         .record(ProduceRecord::new(None, Some("payload".into())))
//!         .build();
//!
//!     let result = gateway.produce_awaiting(batch).await?;
//!     for outcome in result.outcomes() {
//!         println!("{outcome:?}");
//!     }
//!
//!     gateway.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod metadata;
pub mod metrics;
pub mod pool;
pub mod produce;
pub mod response;

pub use broker::{
    BrokerError, ClusterMetadata, Offset, PartitionId, RecordAck, RecordSender, SenderFactory,
    TopicName,
};
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::{ProduceErrorKind, RestGatewayError};
pub use format::EmbeddedFormat;
pub use gateway::RestGateway;
pub use metadata::MetadataGate;
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use pool::{ProducerHandle, ProducerPool};
pub use produce::{
    BatchResult, ProduceBatch, ProduceBatchBuilder, ProduceOrchestrator, ProduceRecord,
    SendOutcome,
};
pub use response::{status_for_error, status_for_result, PartitionOffset, ProduceResponse};

/// Gateway result type
pub type Result<T> = std::result::Result<T, RestGatewayError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
