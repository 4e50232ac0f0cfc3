//! # CV Object Discovery
//!
//! Entry point for the object discovery service.
//!
//! ## Environment
//!
//! - `CV_CONFIG`: TOML config file (optional)
//! - `CV_INTAKE_ADDR`, `CV_FORWARDER_HOST`, `CV_FORWARDER_PORT`, `CV_DOMAIN`
//! - `CV_LOG_LEVEL` / `RUST_LOG`, `CV_JSON_LOGS`, `CV_LOG_SOURCE`

use anyhow::Result;
use tracing::info;

use cv_telemetry::{init_logging, TelemetryConfig};
use discovery_runtime::{load_config, DiscoveryRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env())?;

    let config = load_config()?;

    let mut runtime = DiscoveryRuntime::new(config).await?;
    runtime.start().await?;

    info!("Service is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
