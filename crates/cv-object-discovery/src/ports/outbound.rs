//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the pipeline requires from its host. Concrete adapters live in
//! `crate::adapters`; fakes for tests in `crate::testing`.

use async_trait::async_trait;
use cv_crypto::{CryptoError, HashedId8};
use serde_json::{Map, Value};

use crate::domain::{ClosedPolygon, CodecError, SemiMessage, StoreError, TransportError};

// =============================================================================
// REGISTRATION STORE
// =============================================================================

/// One stored document, as returned by the store.
pub type RawRecord = Map<String, Value>;

/// Spatial + attribute query against the registration collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionQuery {
    pub database: String,
    pub collection: String,
    /// Documents must carry this `serviceId`.
    pub service_id: i64,
    /// Field holding each document's region geometry.
    pub geo_field: String,
    /// Region documents must intersect.
    pub polygon: ClosedPolygon,
    /// Ascending sort key.
    pub sort_field: String,
    /// Maximum documents returned.
    pub limit: usize,
}

/// Spatial store of registration documents.
///
/// Shared across concurrent requests, so reads must be safe in parallel.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Documents matching `query`, at most `query.limit`, ascending by `query.sort_field`.
    async fn find_all(&self, query: &RegionQuery) -> Result<Vec<RawRecord>, StoreError>;
}

// =============================================================================
// WIRE CODEC
// =============================================================================

/// Binary encoding of SEMI messages.
///
/// One instance is built at startup and shared read-only.
pub trait WireCodec: Send + Sync {
    /// Encode a message, enforcing schema size constraints.
    fn encode(&self, message: &SemiMessage) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes into whichever message type they hold.
    fn decode(&self, bytes: &[u8]) -> Result<SemiMessage, CodecError>;
}

// =============================================================================
// CERTIFICATE CRYPTO
// =============================================================================

/// Certificate registration and recipient encryption.
pub trait CertificateCrypto: Send + Sync {
    /// Register an encoded certificate, returning its 8-byte identifier.
    fn register_certificate(&self, certificate: &[u8]) -> Result<HashedId8, CryptoError>;

    /// Encrypt `payload` for the certificate registered as `recipient`.
    fn encrypt(&self, payload: &[u8], recipient: HashedId8, psid: u32) -> Result<Vec<u8>, CryptoError>;
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Where a response goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Connectionless, unreliable datagram delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one payload. `relayed` marks requests that arrived through a
    /// forwarder; the transport may route those back through it.
    async fn send(
        &self,
        destination: &Destination,
        payload: &[u8],
        relayed: bool,
    ) -> Result<(), TransportError>;
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Acknowledgement that a request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// `receiptId` from the request, if any.
    pub receipt_id: Option<String>,
    pub request_id: i32,
    pub group_id: i32,
    /// Records carried by the response.
    pub count_records: u8,
}

/// Fire-and-forget receipt channel.
pub trait ReceiptSink: Send + Sync {
    /// Publish a receipt. Never blocks and never fails the request.
    fn send_receipt(&self, receipt: &Receipt);
}
