//! # CV Crypto - Recipient Certificate Encryption
//!
//! Backs the certificate crypto boundary of the object discovery pipeline:
//! a requester attaches its certificate, the responder registers it to get a
//! short recipient identifier, then seals the response for that recipient.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `certificate` | secp256k1 (SEC1) | Recipient encryption key |
//! | `hashing` | SHA-256 | `HashedId8` certificate identifiers |
//! | `symmetric` | XChaCha20-Poly1305 + AAD | Payload encryption bound to the envelope header |
//! | `envelope` | ECDH + SHA-256 KDF + XChaCha20 | Per-recipient sealed payloads |
//! | `registry` | - | Certificate registration and lookup |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit random nonce, constant-time
//! - **Ephemeral ECDH**: fresh sender key per envelope
//! - **PSID binding**: the service id is mixed into the derived key
//! - **Header binding**: the cleartext header is authenticated with the payload

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod certificate;
pub mod envelope;
pub mod errors;
pub mod hashing;
pub mod registry;
pub mod symmetric;

// Re-exports
pub use certificate::{Certificate, RecipientKeyPair};
pub use envelope::{open, seal, OpenedEnvelope, ENVELOPE_VERSION};
pub use errors::CryptoError;
pub use hashing::{sha256, HashedId8};
pub use registry::CertificateRegistry;
pub use symmetric::{open_payload, seal_payload, ContentKey, Nonce};

/// Service identifier used when encrypting discovery responses.
pub const DEFAULT_PSID: u32 = 0x2fe1;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
