//! # Service Container
//!
//! Builds every adapter from `DiscoveryConfig` and hands the wired
//! `ObjectDiscoveryService` to the runtime.
//!
//! ## Wiring
//!
//! | Port | Adapter | Source |
//! |------|---------|--------|
//! | Store | `InMemoryRegistrationStore` | `store.seed_file`, else empty |
//! | Codec | `BincodeCodec` | - |
//! | Crypto | `RegistryCrypto` | shared certificate registry |
//! | Transport | `UdpTransport` | `forwarder.*` |
//! | Receipts | `ChannelReceiptSink` | `receipts.*` |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use cv_object_discovery::adapters::{
    BincodeCodec, ChannelReceiptSink, InMemoryRegistrationStore, RegistryCrypto, UdpTransport,
};
use cv_object_discovery::domain::ForwarderConfig;
use cv_object_discovery::{DiscoveryConfig, DiscoveryPorts, ObjectDiscoveryService, Receipt};

/// Wired service plus the receiving end of its receipt channel.
pub struct ServiceContainer {
    pub config: DiscoveryConfig,
    pub service: Arc<ObjectDiscoveryService>,
    pub store: Arc<InMemoryRegistrationStore>,
    pub crypto: Arc<RegistryCrypto>,
    receipts: Option<mpsc::Receiver<Receipt>>,
}

impl ServiceContainer {
    /// Build all adapters.
    ///
    /// A forwarder host that does not resolve is logged and the transport
    /// runs without one.
    ///
    /// # Errors
    ///
    /// Fails if the seed file cannot be loaded or the send socket cannot bind.
    pub async fn build(config: DiscoveryConfig) -> Result<Self> {
        let store = match &config.store.seed_file {
            Some(path) => InMemoryRegistrationStore::from_seed_file(path)
                .with_context(|| format!("Failed to seed registration store from {}", path.display()))?,
            None => InMemoryRegistrationStore::new(),
        };
        let store = Arc::new(store);

        let forwarder = resolve_forwarder(&config.forwarder).await;
        let transport = UdpTransport::bind("0.0.0.0:0", forwarder, config.forwarder.forward_all)
            .await
            .context("Failed to bind response socket")?;

        let (receipt_sink, receipts) =
            ChannelReceiptSink::new(config.receipts.topic_name.clone(), config.receipts.channel_capacity);

        let crypto = Arc::new(RegistryCrypto::new());
        let ports = DiscoveryPorts {
            store: store.clone(),
            codec: Arc::new(BincodeCodec::new()),
            crypto: crypto.clone(),
            transport: Arc::new(transport),
            receipts: Arc::new(receipt_sink),
        };

        info!(
            collection = %config.store.collection_name,
            documents = store.len(),
            forwarder = ?forwarder,
            "Object discovery service wired"
        );

        Ok(Self {
            service: Arc::new(ObjectDiscoveryService::new(config.clone(), ports)),
            config,
            store,
            crypto,
            receipts: Some(receipts),
        })
    }

    /// Take the receipt receiver. Only the first call gets it.
    pub fn take_receipts(&mut self) -> Option<mpsc::Receiver<Receipt>> {
        self.receipts.take()
    }
}

async fn resolve_forwarder(config: &ForwarderConfig) -> Option<SocketAddr> {
    let host = config.host.as_deref()?;
    match tokio::net::lookup_host((host, config.port)).await {
        Ok(addrs) => {
            // the response socket is IPv4; IPv6 needs the companion socket
            let addrs: Vec<SocketAddr> = addrs.collect();
            let addr = addrs.iter().find(|a| a.is_ipv4()).or_else(|| addrs.first()).copied();
            if addr.is_none() {
                warn!(host, port = config.port, "Forwarder host resolved to no address");
            }
            addr
        }
        Err(e) => {
            warn!(host, port = config.port, error = %e, "Failed to resolve forwarder, sending direct");
            None
        }
    }
}
