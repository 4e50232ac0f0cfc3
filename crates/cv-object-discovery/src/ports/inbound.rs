//! # Driving Port (Inbound API)
//!
//! What a request source (UDP intake, tests) uses to run the pipeline.

use async_trait::async_trait;

use crate::domain::DiscoveryError;

/// How the delivered payload was protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// No certificate on the request.
    Plaintext,
    /// Encrypted for the requester's certificate.
    Encrypted,
    /// Encryption failed and the fallback sent plaintext.
    PlaintextFallback,
}

/// Result of one successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub protection: Protection,
    /// Attempts used, 1..=max_attempts.
    pub attempts: u32,
    pub payload_len: usize,
}

/// What happened to one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not an object discovery request; nothing queried or sent.
    Ignored { dialog_id: i64 },
    /// Response delivered.
    Responded {
        request_id: i32,
        count_records: u8,
        report: DispatchReport,
    },
}

/// Object discovery entry point.
#[async_trait]
pub trait DiscoveryApi: Send + Sync {
    /// Run one raw JSON request through the pipeline.
    ///
    /// # Errors
    ///
    /// Any validation, store, decode or dispatch failure for this request.
    /// A wrong dialog id is not an error: it yields `Outcome::Ignored`.
    async fn handle(&self, raw: &str) -> Result<Outcome, DiscoveryError>;
}
