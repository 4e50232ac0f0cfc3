//! # Payload AEAD
//!
//! XChaCha20-Poly1305 with associated data. Envelopes pass their cleartext
//! header as the associated data so a header edited in transit (PSID,
//! recipient, ephemeral key) fails authentication along with the body.

use crate::CryptoError;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Per-envelope content key. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    /// Wrap derived key material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new((&self.0).into())
    }
}

/// 192-bit AEAD nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Fresh random nonce.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Nonce read back from an envelope header.
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Encrypt `plaintext`, authenticating `aad` alongside it.
///
/// # Errors
///
/// `CryptoError::EncryptionFailed` if the cipher rejects the input.
pub fn seal_payload(
    key: &ContentKey,
    nonce: &Nonce,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    key.cipher()
        .encrypt(XNonce::from_slice(&nonce.0), Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Decrypt and authenticate.
///
/// # Errors
///
/// `CryptoError::DecryptionFailed` on a wrong key, nonce or `aad`, or tampered ciphertext.
pub fn open_payload(
    key: &ContentKey,
    nonce: &Nonce,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    key.cipher()
        .decrypt(XNonce::from_slice(&nonce.0), Payload { msg: ciphertext, aad })
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
