//! # Certificate Registry
//!
//! Remembers recipient certificates by `HashedId8` so a responder can seal
//! payloads for a recipient it has seen before. Safe for concurrent use.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::certificate::Certificate;
use crate::envelope;
use crate::{CryptoError, HashedId8};

/// Registry of recipient certificates.
#[derive(Default)]
pub struct CertificateRegistry {
    certificates: RwLock<HashMap<HashedId8, Certificate>>,
}

impl CertificateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register an encoded certificate, returning its identifier.
    ///
    /// Registering the same certificate twice returns the same identifier.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidCertificate` if the bytes do not parse.
    pub fn register(&self, encoded: &[u8]) -> Result<HashedId8, CryptoError> {
        let certificate = Certificate::from_bytes(encoded)?;
        let id = certificate.id();
        let mut certificates = self.certificates.write();
        if certificates.insert(id, certificate).is_none() {
            debug!(cert_id = %id, "Registered recipient certificate");
        }
        Ok(id)
    }

    /// Seal `plaintext` for a registered recipient under `psid`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::UnknownRecipient` if `id` was never registered
    /// - `CryptoError::EncryptionFailed` if sealing fails
    pub fn encrypt(&self, plaintext: &[u8], id: HashedId8, psid: u32) -> Result<Vec<u8>, CryptoError> {
        let certificates = self.certificates.read();
        let certificate = certificates
            .get(&id)
            .ok_or_else(|| CryptoError::UnknownRecipient(id.to_string()))?;
        envelope::seal(certificate, psid, plaintext)
    }

    /// Whether a certificate is registered under `id`.
    pub fn contains(&self, id: &HashedId8) -> bool {
        self.certificates.read().contains_key(id)
    }

    /// Number of registered certificates.
    pub fn len(&self) -> usize {
        self.certificates.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.certificates.read().is_empty()
    }
}
