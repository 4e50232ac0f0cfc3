//! # SHA-256 Hashing
//!
//! Certificate identifiers follow the IEEE 1609.2 convention: a `HashedId8`
//! is the low-order eight bytes of the SHA-256 digest of the encoded
//! certificate.

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash multiple inputs as one stream.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Eight-byte certificate identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashedId8([u8; 8]);

impl HashedId8 {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Derive the identifier of an encoded certificate.
    pub fn of(encoded_certificate: &[u8]) -> Self {
        let digest = sha256(encoded_certificate);
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[24..32]);
        Self(id)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for HashedId8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for HashedId8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedId8({})", hex::encode(self.0))
    }
}
