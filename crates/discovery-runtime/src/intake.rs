//! # Request Intake
//!
//! Receives discovery requests as UDP datagrams (one JSON document each) and
//! runs each one through the service on its own task. A semaphore caps the
//! number of requests in flight; when it is exhausted the loop stops reading
//! until a slot frees up.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn, Instrument};

use cv_object_discovery::ObjectDiscoveryService;
use cv_telemetry::RequestContext;

/// Largest datagram accepted.
pub const MAX_DATAGRAM: usize = 65_507;

/// UDP request listener.
pub struct IntakeListener {
    socket: UdpSocket,
    service: Arc<ObjectDiscoveryService>,
    permits: Arc<Semaphore>,
}

impl IntakeListener {
    /// Bind the intake socket.
    ///
    /// # Errors
    ///
    /// Returns error if socket binding fails.
    pub async fn bind(
        bind_addr: &str,
        service: Arc<ObjectDiscoveryService>,
        max_concurrent: usize,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        info!(local = %socket.local_addr()?, max_concurrent, "Intake listening");
        Ok(Self {
            socket,
            service,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.changed() => break,
            };

            let (len, peer) = tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!(error = %e, "Intake receive failed");
                        continue;
                    }
                },
                _ = shutdown.changed() => break,
            };

            let raw = match std::str::from_utf8(&buf[..len]) {
                Ok(text) => text.to_owned(),
                Err(_) => {
                    warn!(%peer, bytes = len, "Dropping non-UTF-8 request");
                    continue;
                }
            };

            let context = RequestContext::new(Some(peer));
            let service = Arc::clone(&self.service);
            tokio::spawn(
                async move {
                    debug!(bytes = raw.len(), "Request received");
                    service.process(&raw).await;
                    drop(permit);
                }
                .instrument(context.span()),
            );
        }
        info!("Intake stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_object_discovery::adapters::{BincodeCodec, NoOpReceiptSink};
    use cv_object_discovery::testing::{sample_request_json, RecordingTransport, StaticCrypto, StaticStore};
    use cv_object_discovery::{DiscoveryConfig, DiscoveryPorts};
    use std::time::Duration;

    fn service(transport: Arc<RecordingTransport>) -> Arc<ObjectDiscoveryService> {
        let ports = DiscoveryPorts {
            store: Arc::new(StaticStore::new(Vec::new())),
            codec: Arc::new(BincodeCodec::new()),
            crypto: Arc::new(StaticCrypto::new()),
            transport,
            receipts: Arc::new(NoOpReceiptSink),
        };
        Arc::new(ObjectDiscoveryService::new(DiscoveryConfig::default(), ports))
    }

    async fn wait_for_sends(transport: &RecordingTransport, n: usize) {
        for _ in 0..200 {
            if transport.sent().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} sends, saw {}", transport.sent().len());
    }

    #[tokio::test]
    async fn test_datagram_is_processed() {
        let transport = Arc::new(RecordingTransport::new());
        let listener = IntakeListener::bind("127.0.0.1:0", service(transport.clone()), 4)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(listener.run(shutdown_rx));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"not json", addr).await.unwrap();
        client.send_to(sample_request_json().as_bytes(), addr).await.unwrap();

        wait_for_sends(&transport, 1).await;
        assert_eq!(transport.sent()[0].destination.port, 46753);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_listener() {
        let transport = Arc::new(RecordingTransport::new());
        let listener = IntakeListener::bind("127.0.0.1:0", service(transport), 1)
            .await
            .unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(listener.run(shutdown_rx));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
