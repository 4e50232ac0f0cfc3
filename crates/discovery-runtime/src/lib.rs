//! # Discovery Runtime Library
//!
//! Exposes the runtime's wiring and intake loop for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`CV_CONFIG` file, else defaults, plus env overrides)
//! 2. Initialize logging
//! 3. Build adapters and the service (`ServiceContainer`)
//! 4. Start the receipt drain and the UDP intake
//! 5. Run until Ctrl+C, then signal shutdown

pub mod container;
pub mod intake;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use cv_object_discovery::adapters::{ConfigLoader, CONFIG_PATH_ENV};
use cv_object_discovery::{DiscoveryConfig, Receipt};

pub use container::ServiceContainer;
pub use intake::IntakeListener;

/// Load configuration from `CV_CONFIG` when set, otherwise from defaults.
///
/// # Errors
///
/// Fails if the file cannot be loaded or the merged config is invalid.
pub fn load_config() -> Result<DiscoveryConfig> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => ConfigLoader::load(&path).with_context(|| format!("Failed to load config from {path}")),
        Err(_) => ConfigLoader::from_env().context("Invalid configuration"),
    }
}

/// Running service: intake plus receipt drain.
pub struct DiscoveryRuntime {
    container: ServiceContainer,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl DiscoveryRuntime {
    /// Wire the service.
    ///
    /// # Errors
    ///
    /// Fails if any adapter cannot be built.
    pub async fn new(config: DiscoveryConfig) -> Result<Self> {
        let container = ServiceContainer::build(config).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Start the receipt drain and intake. Returns the intake address.
    ///
    /// # Errors
    ///
    /// Fails if the intake socket cannot bind.
    pub async fn start(&mut self) -> Result<std::net::SocketAddr> {
        info!("===========================================");
        info!("  CV Object Discovery v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        if let Some(receipts) = self.container.take_receipts() {
            let topic = self.container.config.receipts.topic_name.clone();
            let shutdown = self.shutdown_rx.clone();
            self.tasks.push(tokio::spawn(async move {
                let published = drain_receipts(receipts, topic, shutdown).await;
                info!(published, "Receipt drain stopped");
            }));
        }

        let config = &self.container.config;
        let listener = IntakeListener::bind(
            &config.intake.bind_addr,
            Arc::clone(&self.container.service),
            config.runtime.max_concurrent_requests,
        )
        .await
        .with_context(|| format!("Failed to bind intake on {}", config.intake.bind_addr))?;
        let addr = listener.local_addr()?;
        self.tasks.push(tokio::spawn(listener.run(self.shutdown_rx.clone())));

        info!(intake = %addr, "Object discovery service running");
        Ok(addr)
    }

    /// Signal shutdown and wait briefly for tasks to finish.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for task in self.tasks {
            if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
                error!("Task did not stop within 2s");
            }
        }
        info!("Shutdown complete");
    }
}

/// Publish receipts to the log under their topic until shutdown.
///
/// Receipts already queued when shutdown fires are still published.
/// Returns how many were published.
async fn drain_receipts(
    mut receipts: mpsc::Receiver<Receipt>,
    topic: String,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut published = 0;
    loop {
        tokio::select! {
            receipt = receipts.recv() => match receipt {
                Some(receipt) => {
                    publish_receipt(&topic, &receipt);
                    published += 1;
                }
                None => return published,
            },
            _ = shutdown.changed() => break,
        }
    }
    while let Ok(receipt) = receipts.try_recv() {
        publish_receipt(&topic, &receipt);
        published += 1;
    }
    published
}

fn publish_receipt(topic: &str, receipt: &Receipt) {
    info!(
        topic = %topic,
        receipt_id = receipt.receipt_id.as_deref().unwrap_or(""),
        request_id = receipt.request_id,
        group_id = receipt.group_id,
        count_records = receipt.count_records,
        "Data receipt"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut config = DiscoveryConfig::default();
        config.intake.bind_addr = "127.0.0.1:0".into();

        let mut runtime = DiscoveryRuntime::new(config).await.unwrap();
        let addr = runtime.start().await.unwrap();
        assert_ne!(addr.port(), 0);

        tokio::time::timeout(Duration::from_secs(5), runtime.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_queued_receipts_published_after_shutdown() {
        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        for request_id in 1..=3 {
            tx.send(Receipt {
                receipt_id: Some(format!("r-{request_id}")),
                request_id,
                group_id: 0,
                count_records: 1,
            })
            .await
            .unwrap();
        }
        shutdown_tx.send(true).unwrap();

        let published = tokio::time::timeout(
            Duration::from_secs(1),
            drain_receipts(rx, "receipts".into(), shutdown_rx),
        )
        .await
        .unwrap();

        assert_eq!(published, 3);
        drop(tx);
    }

    #[tokio::test]
    async fn test_bad_intake_address() {
        let mut config = DiscoveryConfig::default();
        config.intake.bind_addr = "not-an-address".into();

        let mut runtime = DiscoveryRuntime::new(config).await.unwrap();
        assert!(runtime.start().await.is_err());
    }
}
