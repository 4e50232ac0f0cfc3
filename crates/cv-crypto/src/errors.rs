//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Certificate could not be parsed
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// No certificate registered under the given identifier
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    /// Envelope bytes are truncated or carry an unknown version
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope was sealed for a different recipient
    #[error("Envelope recipient mismatch: expected {expected}, got {actual}")]
    RecipientMismatch {
        /// Identifier of the opening key pair
        expected: String,
        /// Identifier carried by the envelope
        actual: String,
    },

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,
}
