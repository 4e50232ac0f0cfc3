use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{ConfigError, DiscoveryConfig};

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    dispatch: DispatchSection,
    #[serde(default)]
    forwarder: ForwarderSection,
    #[serde(default)]
    receipts: ReceiptsSection,
    #[serde(default)]
    intake: IntakeSection,
    #[serde(default)]
    runtime: RuntimeSection,
}

#[derive(Debug, Deserialize, Default)]
struct StoreSection {
    database_name: Option<String>,
    collection_name: Option<String>,
    geospatial_field_name: Option<String>,
    query_timeout_ms: Option<u64>,
    seed_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct DispatchSection {
    max_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    post_send_delay_ms: Option<u64>,
    send_timeout_ms: Option<u64>,
    plaintext_fallback: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ForwarderSection {
    host: Option<String>,
    port: Option<u16>,
    forward_all: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ReceiptsSection {
    topic_name: Option<String>,
    channel_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct IntakeSection {
    bind_addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RuntimeSection {
    max_concurrent_requests: Option<usize>,
}

// ============================================================================
// ConfigLoader
// ============================================================================

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CV_CONFIG";

/// Loads `DiscoveryConfig` from TOML plus environment overrides.
///
/// # Config File Format
///
/// ```toml
/// [store]
/// database_name = "cvdb"
/// collection_name = "objectRegister"
/// geospatial_field_name = "region"
/// query_timeout_ms = 3000
/// seed_file = "registrations.json"
///
/// [dispatch]
/// max_attempts = 3
/// retry_delay_ms = 10
/// post_send_delay_ms = 10
/// send_timeout_ms = 1000
/// plaintext_fallback = true
///
/// [forwarder]
/// host = "forwarder.%s"   # %s expands to CV_DOMAIN
/// port = 46761
/// forward_all = false
///
/// [receipts]
/// topic_name = "cv.receipts"
/// channel_capacity = 1024
///
/// [intake]
/// bind_addr = "0.0.0.0:46762"
///
/// [runtime]
/// max_concurrent_requests = 64
/// ```
///
/// # Environment Overrides
///
/// - `CV_INTAKE_ADDR`: `intake.bind_addr`
/// - `CV_FORWARDER_HOST`: `forwarder.host`
/// - `CV_FORWARDER_PORT`: `forwarder.port`
/// - `CV_DOMAIN`: substituted for a trailing `%s` in `forwarder.host`
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from a TOML file, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or the result is invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DiscoveryConfig, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        let config = Self::parse(&content)?;
        Self::finish(config, |key| std::env::var(key).ok())
    }

    /// Defaults plus environment overrides, for running without a file.
    ///
    /// # Errors
    ///
    /// Returns error if an override is malformed.
    pub fn from_env() -> Result<DiscoveryConfig, ConfigError> {
        Self::finish(DiscoveryConfig::default(), |key| std::env::var(key).ok())
    }

    /// Parse a TOML string. Missing sections and keys take defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` on malformed TOML or unknown sections.
    pub fn parse(content: &str) -> Result<DiscoveryConfig, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = DiscoveryConfig::default();

        let s = file.store;
        let store = &mut config.store;
        store.database_name = s.database_name.unwrap_or(store.database_name.clone());
        store.collection_name = s.collection_name.unwrap_or(store.collection_name.clone());
        store.geospatial_field_name = s
            .geospatial_field_name
            .unwrap_or(store.geospatial_field_name.clone());
        store.query_timeout = s
            .query_timeout_ms
            .map_or(store.query_timeout, Duration::from_millis);
        store.seed_file = s.seed_file;

        let d = file.dispatch;
        let dispatch = &mut config.dispatch;
        dispatch.max_attempts = d.max_attempts.unwrap_or(dispatch.max_attempts);
        dispatch.retry_delay = d.retry_delay_ms.map_or(dispatch.retry_delay, Duration::from_millis);
        dispatch.post_send_delay = d
            .post_send_delay_ms
            .map_or(dispatch.post_send_delay, Duration::from_millis);
        dispatch.send_timeout = d.send_timeout_ms.map_or(dispatch.send_timeout, Duration::from_millis);
        dispatch.plaintext_fallback = d.plaintext_fallback.unwrap_or(dispatch.plaintext_fallback);

        let f = file.forwarder;
        config.forwarder.host = f.host.filter(|h| !h.trim().is_empty());
        config.forwarder.port = f.port.unwrap_or(config.forwarder.port);
        config.forwarder.forward_all = f.forward_all.unwrap_or(config.forwarder.forward_all);

        let r = file.receipts;
        config.receipts.topic_name = r.topic_name.unwrap_or(config.receipts.topic_name.clone());
        config.receipts.channel_capacity = r.channel_capacity.unwrap_or(config.receipts.channel_capacity);

        if let Some(bind_addr) = file.intake.bind_addr {
            config.intake.bind_addr = bind_addr;
        }
        config.runtime.max_concurrent_requests = file
            .runtime
            .max_concurrent_requests
            .unwrap_or(config.runtime.max_concurrent_requests);

        Ok(config)
    }

    /// Apply overrides from `lookup`, expand the domain template, validate.
    pub(crate) fn finish<F>(mut config: DiscoveryConfig, lookup: F) -> Result<DiscoveryConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("CV_INTAKE_ADDR") {
            config.intake.bind_addr = addr;
        }
        if let Some(host) = lookup("CV_FORWARDER_HOST") {
            config.forwarder.host = Some(host).filter(|h| !h.trim().is_empty());
        }
        if let Some(port) = lookup("CV_FORWARDER_PORT") {
            config.forwarder.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "forwarder.port",
                reason: format!("CV_FORWARDER_PORT '{port}' is not a port number"),
            })?;
        }

        if let Some(host) = config.forwarder.host.take() {
            config.forwarder.host = Some(expand_domain(&host, lookup("CV_DOMAIN").as_deref())?);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Replace a trailing `%s` with the deployment domain.
fn expand_domain(host: &str, domain: Option<&str>) -> Result<String, ConfigError> {
    let Some(prefix) = host.strip_suffix("%s") else {
        return Ok(host.to_string());
    };
    match domain {
        Some(domain) if !domain.trim().is_empty() => Ok(format!("{prefix}{}", domain.trim())),
        _ => Err(ConfigError::Invalid {
            field: "forwarder.host",
            reason: format!("'{host}' needs CV_DOMAIN to be set"),
        }),
    }
}
