//! # Secure Dispatcher
//!
//! Serializes a discovery response, encrypts it for the requester when a
//! certificate is attached, and sends it with bounded retry.
//!
//! ```text
//! Built -> Serialized -> (Encrypted | PlaintextFallback) -> Sending(1..=N) -> Sent | Failed
//! ```
//!
//! Serialization failures are never retried. Only the transport step is.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cv_crypto::DEFAULT_PSID;
use tracing::{debug, error, warn};

use crate::domain::{
    DiscoveryRequest, DispatchConfig, DispatchError, ObjectDiscoveryData, SemiMessage,
    TransportError,
};
use crate::ports::{CertificateCrypto, Destination, DispatchReport, Protection, Transport, WireCodec};

/// Encrypt-then-send delivery of discovery responses.
pub struct SecureDispatcher {
    codec: Arc<dyn WireCodec>,
    crypto: Arc<dyn CertificateCrypto>,
    transport: Arc<dyn Transport>,
    config: DispatchConfig,
}

impl SecureDispatcher {
    pub fn new(
        codec: Arc<dyn WireCodec>,
        crypto: Arc<dyn CertificateCrypto>,
        transport: Arc<dyn Transport>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            codec,
            crypto,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deliver `response` to the destination named in `request`.
    ///
    /// # Errors
    ///
    /// - `DispatchError::Serialization` if encoding fails (nothing sent)
    /// - `DispatchError::Encryption` if encryption fails and fallback is off
    /// - `DispatchError::Exhausted` with the last transport error after
    ///   `max_attempts` failed sends
    pub async fn send(
        &self,
        request: &DiscoveryRequest,
        response: &ObjectDiscoveryData,
    ) -> Result<DispatchReport, DispatchError> {
        let payload = self
            .codec
            .encode(&SemiMessage::ObjectDiscovery(response.clone()))
            .map_err(DispatchError::Serialization)?;

        let (payload, protection) = self.protect(request, payload)?;
        let attempts = self.deliver(request, &payload).await?;

        Ok(DispatchReport {
            protection,
            attempts,
            payload_len: payload.len(),
        })
    }

    fn protect(
        &self,
        request: &DiscoveryRequest,
        payload: Vec<u8>,
    ) -> Result<(Vec<u8>, Protection), DispatchError> {
        let Some(certificate) = request.certificate.as_deref() else {
            return Ok((payload, Protection::Plaintext));
        };

        match self.encrypt_for(certificate, &payload) {
            Ok(sealed) => {
                debug!(request_id = request.request_id, "Encrypted discovery response for requester");
                Ok((sealed, Protection::Encrypted))
            }
            Err(reason) if self.config.plaintext_fallback => {
                error!(
                    request_id = request.request_id,
                    %reason,
                    "Couldn't encrypt outgoing message, sending plaintext"
                );
                Ok((payload, Protection::PlaintextFallback))
            }
            Err(reason) => {
                error!(request_id = request.request_id, %reason, "Couldn't encrypt outgoing message");
                Err(DispatchError::Encryption(reason))
            }
        }
    }

    fn encrypt_for(&self, certificate_b64: &str, payload: &[u8]) -> Result<Vec<u8>, String> {
        let certificate = STANDARD
            .decode(certificate_b64.trim())
            .map_err(|e| format!("invalid certificate encoding: {e}"))?;
        let recipient = self
            .crypto
            .register_certificate(&certificate)
            .map_err(|e| e.to_string())?;
        self.crypto
            .encrypt(payload, recipient, DEFAULT_PSID)
            .map_err(|e| e.to_string())
    }

    async fn deliver(&self, request: &DiscoveryRequest, payload: &[u8]) -> Result<u32, DispatchError> {
        let destination = Destination {
            host: request.dest_host().to_string(),
            port: request.dest_port,
        };
        let max_attempts = self.config.max_attempts.max(1);
        let mut last = TransportError::Io("no attempt made".into());

        for attempt in 1..=max_attempts {
            debug!(
                request_id = request.request_id,
                attempt,
                destination = %destination,
                "Sending Object Discovery data"
            );
            match self.send_once(&destination, payload, request.from_forwarder).await {
                Ok(()) => {
                    tokio::time::sleep(self.config.post_send_delay).await;
                    return Ok(attempt);
                }
                Err(e) => {
                    warn!(
                        request_id = request.request_id,
                        attempt,
                        error = %e,
                        "Failed to send Object Discovery data"
                    );
                    last = e;
                }
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        error!(
            request_id = request.request_id,
            attempts = max_attempts,
            error = %last,
            "Giving up on Object Discovery data"
        );
        Err(DispatchError::Exhausted {
            attempts: max_attempts,
            last,
        })
    }

    async fn send_once(
        &self,
        destination: &Destination,
        payload: &[u8],
        relayed: bool,
    ) -> Result<(), TransportError> {
        let timeout = self.config.send_timeout;
        match tokio::time::timeout(timeout, self.transport.send(destination, payload, relayed)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                after_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
