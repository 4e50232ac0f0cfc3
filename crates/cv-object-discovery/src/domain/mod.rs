//! # Domain Layer
//!
//! Pure types and rules: request validation, bounding boxes, SEMI message
//! shapes and the response fold. No I/O.

pub mod config;
pub mod errors;
pub mod geo;
pub mod messages;
pub mod request;
pub mod response;

pub use config::{
    DiscoveryConfig, DispatchConfig, ForwarderConfig, IntakeConfig, ReceiptConfig, RuntimeConfig,
    StoreConfig, MAX_RECORDS, TIMESTAMP_FIELD,
};
pub use errors::{
    CodecError, ConfigError, DecodeError, DiscoveryError, DispatchError, GeoError, RequestError,
    StoreError, TransportError,
};
pub use geo::{BoundingBox, ClosedPolygon, GeoRect, LatLon};
pub use messages::{
    ConnectionPoint, DataReceipt, GeoRegion, GroupId, ObjectDiscoveryData, ObjectRegistrationData,
    Position3D, SemiDialogId, SemiMessage, SemiSequenceId, ServiceInfo, ServiceRecord, TemporaryId,
    MAX_SERVICE_RECORDS,
};
pub use request::{peek_dialog_id, DiscoveryRequest, DISCOVERY_DIALOG_ID};
pub use response::{blank_service_record, build_discovery_data};
