//! Pipeline configuration.
//!
//! Plain structs with defaults matching the deployed data-sink. The TOML
//! loader in `adapters::config` fills these from a file plus environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::errors::ConfigError;

/// Records requested from the store per query.
pub const MAX_RECORDS: usize = 400;

/// Field the store sorts by.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Registration store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_name: String,
    pub collection_name: String,
    /// Document field holding the registration's region polygon.
    pub geospatial_field_name: String,
    pub query_timeout: Duration,
    /// JSON array of registration documents loaded at startup.
    pub seed_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_name: "cvdb".to_string(),
            collection_name: "objectRegister".to_string(),
            geospatial_field_name: "region".to_string(),
            query_timeout: Duration::from_millis(3000),
            seed_file: None,
        }
    }
}

/// Response delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Total send attempts, including the first.
    pub max_attempts: u32,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
    /// Pause after a successful send.
    pub post_send_delay: Duration,
    /// Bound on a single send attempt.
    pub send_timeout: Duration,
    /// Send unencrypted when encryption for the requester fails.
    pub plaintext_fallback: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(10),
            post_send_delay: Duration::from_millis(10),
            send_timeout: Duration::from_millis(1000),
            plaintext_fallback: true,
        }
    }
}

impl DispatchConfig {
    /// Disable the plaintext fallback.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.plaintext_fallback = false;
        self
    }

    /// Zero delays, for tests.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self.post_send_delay = Duration::ZERO;
        self
    }
}

/// Bundle forwarder the transport relays through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Forwarder host; `None` disables forwarding.
    pub host: Option<String>,
    pub port: u16,
    /// Forward every response, not only relayed ones.
    pub forward_all: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 46761,
            forward_all: false,
        }
    }
}

/// Receipt notification settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptConfig {
    pub topic_name: String,
    pub channel_capacity: usize,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            topic_name: "cv.receipts".to_string(),
            channel_capacity: 1024,
        }
    }
}

/// Request intake socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub bind_addr: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:46762".to_string(),
        }
    }
}

/// Worker limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub max_concurrent_requests: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 64,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscoveryConfig {
    pub store: StoreConfig,
    pub dispatch: DispatchConfig,
    pub forwarder: ForwarderConfig,
    pub receipts: ReceiptConfig,
    pub intake: IntakeConfig,
    pub runtime: RuntimeConfig,
}

impl DiscoveryConfig {
    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "dispatch.max_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.store.collection_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.collection_name",
                reason: "must not be empty".into(),
            });
        }
        if self.store.geospatial_field_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.geospatial_field_name",
                reason: "must not be empty".into(),
            });
        }
        if self.forwarder.host.is_some() && self.forwarder.port == 0 {
            return Err(ConfigError::Invalid {
                field: "forwarder.port",
                reason: "must be non-zero when a forwarder host is set".into(),
            });
        }
        if self.runtime.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid {
                field: "runtime.max_concurrent_requests",
                reason: "must be at least 1".into(),
            });
        }
        if self.receipts.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "receipts.channel_capacity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
