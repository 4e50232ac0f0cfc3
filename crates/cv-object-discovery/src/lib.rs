//! # Object Discovery
//!
//! Answers "who provides service X near location Y" for the connected-vehicle
//! discovery network.
//!
//! A requester sends a bounding box and a service id. The service queries the
//! registration store, folds the matching registrations into one
//! `ObjectDiscoveryData` (1..=10 records, a blank record when nothing
//! matched), optionally encrypts it for the requester's certificate and
//! sends it back over UDP with bounded retry.
//!
//! ## Architecture
//!
//! - **Domain Layer:** request validation, bounding boxes, message shapes, response fold
//! - **Ports Layer:** `DiscoveryApi` inbound; store, codec, crypto, transport, receipts outbound
//! - **Service Layer:** `ObjectDiscoveryService`, `RecordDecoder`, `SecureDispatcher`
//! - **Adapters Layer:** bincode codec, in-memory store, UDP transport (feature `adapters`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cv_object_discovery::adapters::*;
//! use cv_object_discovery::{DiscoveryConfig, DiscoveryPorts, ObjectDiscoveryService};
//!
//! let ports = DiscoveryPorts {
//!     store: Arc::new(InMemoryRegistrationStore::new()),
//!     codec: Arc::new(BincodeCodec::new()),
//!     crypto: Arc::new(RegistryCrypto::new()),
//!     transport: Arc::new(UdpTransport::bind("0.0.0.0:0", None, false).await?),
//!     receipts: Arc::new(NoOpReceiptSink),
//! };
//! let service = ObjectDiscoveryService::new(DiscoveryConfig::default(), ports);
//! service.process(raw_json).await;
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// FEATURE-GATED MODULES
// =============================================================================

/// Concrete adapters. Requires feature: `adapters`
#[cfg(feature = "adapters")]
pub mod adapters;

/// Port fakes and fixtures. Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use domain::{
    blank_service_record, build_discovery_data, peek_dialog_id, BoundingBox, ClosedPolygon,
    CodecError, ConfigError, DecodeError, DiscoveryConfig, DiscoveryError, DiscoveryRequest,
    DispatchConfig, DispatchError, GeoError, LatLon, ObjectDiscoveryData, ObjectRegistrationData,
    RequestError, SemiDialogId, SemiMessage, SemiSequenceId, ServiceRecord, StoreError,
    TransportError, DISCOVERY_DIALOG_ID, MAX_RECORDS, MAX_SERVICE_RECORDS, TIMESTAMP_FIELD,
};
pub use ports::{
    CertificateCrypto, Destination, DiscoveryApi, DispatchReport, Outcome, Protection, RawRecord,
    Receipt, ReceiptSink, RegionQuery, RegistrationStore, Transport, WireCodec,
};
pub use service::{DiscoveryPorts, ObjectDiscoveryService, RecordDecoder, SecureDispatcher};
