//! `CertificateCrypto` backed by the `cv-crypto` certificate registry.

use std::sync::Arc;

use cv_crypto::{CertificateRegistry, CryptoError, HashedId8};

use crate::ports::CertificateCrypto;

/// Registers requester certificates and seals payloads for them.
#[derive(Clone, Default)]
pub struct RegistryCrypto {
    registry: Arc<CertificateRegistry>,
}

impl RegistryCrypto {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing registry.
    pub fn with_registry(registry: Arc<CertificateRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CertificateRegistry {
        &self.registry
    }
}

impl CertificateCrypto for RegistryCrypto {
    fn register_certificate(&self, certificate: &[u8]) -> Result<HashedId8, CryptoError> {
        self.registry.register(certificate)
    }

    fn encrypt(&self, payload: &[u8], recipient: HashedId8, psid: u32) -> Result<Vec<u8>, CryptoError> {
        self.registry.encrypt(payload, recipient, psid)
    }
}
