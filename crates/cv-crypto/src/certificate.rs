//! # Recipient Certificates
//!
//! A recipient certificate carries the requester's secp256k1 encryption key
//! in SEC1 form (compressed or uncompressed). The certificate identifier is
//! the `HashedId8` of the encoded bytes exactly as received, so the same
//! requester always maps to the same identifier.

use crate::{CryptoError, HashedId8};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey as EcSecretKey};

/// Parsed recipient certificate.
#[derive(Clone, Debug)]
pub struct Certificate {
    id: HashedId8,
    encryption_key: PublicKey,
    encoded: Vec<u8>,
}

impl Certificate {
    /// Parse an encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidCertificate` when the bytes are empty or
    /// do not hold a valid curve point.
    pub fn from_bytes(encoded: &[u8]) -> Result<Self, CryptoError> {
        if encoded.is_empty() {
            return Err(CryptoError::InvalidCertificate("empty certificate".into()));
        }
        let encryption_key = PublicKey::from_sec1_bytes(encoded).map_err(|e| {
            CryptoError::InvalidCertificate(format!("bad encryption key: {e}"))
        })?;
        Ok(Self {
            id: HashedId8::of(encoded),
            encryption_key,
            encoded: encoded.to_vec(),
        })
    }

    /// Certificate identifier.
    pub fn id(&self) -> HashedId8 {
        self.id
    }

    /// Recipient encryption key.
    pub fn encryption_key(&self) -> &PublicKey {
        &self.encryption_key
    }

    /// Encoded form as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }
}

/// Requester-side key pair able to open envelopes.
pub struct RecipientKeyPair {
    secret: EcSecretKey,
}

impl RecipientKeyPair {
    /// Generate random key pair.
    pub fn generate() -> Self {
        Self {
            secret: EcSecretKey::random(&mut rand::thread_rng()),
        }
    }

    /// Encoded certificate (compressed SEC1 public key) to hand to responders.
    pub fn certificate_bytes(&self) -> Vec<u8> {
        self.secret
            .public_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Identifier responders will assign to this key pair's certificate.
    pub fn certificate_id(&self) -> HashedId8 {
        HashedId8::of(&self.certificate_bytes())
    }

    pub(crate) fn secret(&self) -> &EcSecretKey {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generated_certificate() {
        let keys = RecipientKeyPair::generate();
        let cert = Certificate::from_bytes(&keys.certificate_bytes()).unwrap();

        assert_eq!(cert.id(), keys.certificate_id());
        assert_eq!(cert.as_bytes().len(), 33);
    }

    #[test]
    fn test_uncompressed_key_accepted() {
        let keys = RecipientKeyPair::generate();
        let uncompressed = keys.secret().public_key().to_encoded_point(false);
        let cert = Certificate::from_bytes(uncompressed.as_bytes()).unwrap();
        assert_eq!(cert.encryption_key(), &keys.secret().public_key());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            Certificate::from_bytes(b"not a certificate"),
            Err(CryptoError::InvalidCertificate(_))
        ));
        assert!(Certificate::from_bytes(&[]).is_err());
    }
}
