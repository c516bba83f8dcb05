//! Configuration types for the REST produce gateway

use std::time::Duration;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// List of broker addresses
    pub brokers: Vec<String>,
    /// Client identifier passed to broker sessions
    pub client_id: Option<String>,
    /// Timeout applied by the underlying client per send
    pub request_timeout: Duration,
    /// Maximum accepted record value size in bytes
    pub max_message_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            client_id: None,
            request_timeout: Duration::from_secs(30),
            max_message_size: 1024 * 1024, // 1MB
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }
}

/// Builder for GatewayConfig
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.brokers = brokers.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn client_id<S: Into<String>>(mut self, client_id: S) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}
