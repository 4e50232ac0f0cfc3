//! # SEMI Message Types
//!
//! Structured forms of the messages exchanged on the discovery network.
//! The binary encoding lives behind the `WireCodec` port; these types only
//! carry the data and the cardinality limits of the wire schema.
//!
//! Coordinates inside messages are integers in 1/10 micro-degrees
//! (`degrees * 10_000_000`), as on the wire.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Maximum service records a discovery response can carry.
pub const MAX_SERVICE_RECORDS: usize = 10;

/// Scale between degrees and wire coordinate units.
pub const COORDINATE_SCALE: f64 = 10_000_000.0;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Dialog a SEMI message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemiDialogId {
    /// Vehicle situation data deposit
    VehSitData,
    /// Data subscription
    DataSubscription,
    /// Advisory situation data deposit
    AdvSitDataDep,
    /// Advisory situation data distribution
    AdvSitDatDist,
    /// Object registration
    ObjReg,
    /// Object discovery
    ObjDisc,
    /// Intersection situation data deposit
    IntersectionSitDataDep,
    /// Intersection situation data query
    IntersectionSitDataQuery,
}

impl SemiDialogId {
    /// Numeric dialog id as carried in inbound JSON.
    pub const fn value(self) -> i64 {
        match self {
            Self::VehSitData => 154,
            Self::DataSubscription => 155,
            Self::AdvSitDataDep => 156,
            Self::AdvSitDatDist => 157,
            Self::ObjReg => 160,
            Self::ObjDisc => 161,
            Self::IntersectionSitDataDep => 162,
            Self::IntersectionSitDataQuery => 163,
        }
    }
}

/// Position of a message within its dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemiSequenceId {
    /// Service request
    SvcReq,
    /// Service response
    SvcResp,
    /// Data request
    DataReq,
    /// Data confirmation
    DataConf,
    /// Data
    Data,
    /// Acceptance
    Accept,
    /// Receipt
    Receipt,
}

impl SemiSequenceId {
    /// Numeric sequence id.
    pub const fn value(self) -> i64 {
        match self {
            Self::SvcReq => 1,
            Self::SvcResp => 2,
            Self::DataReq => 3,
            Self::DataConf => 4,
            Self::Data => 5,
            Self::Accept => 6,
            Self::Receipt => 7,
        }
    }
}

/// Four-byte temporary id. Request ids travel as big-endian integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TemporaryId(pub [u8; 4]);

impl TemporaryId {
    /// Encode an integer request id.
    pub fn from_request_id(request_id: i32) -> Self {
        Self(request_id.to_be_bytes())
    }

    /// Integer form, for logging.
    pub fn to_request_id(self) -> i32 {
        i32::from_be_bytes(self.0)
    }
}

/// Four-byte group id, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GroupId(pub [u8; 4]);

impl GroupId {
    /// Encode an integer group id.
    pub fn from_group_id(group_id: i32) -> Self {
        Self(group_id.to_be_bytes())
    }
}

// =============================================================================
// SERVICE RECORDS
// =============================================================================

/// Endpoint a provider accepts connections on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    /// Provider address; absent means "the sender of the registration".
    pub address: Option<IpAddr>,
    /// Port number.
    pub port: u16,
}

/// Point in wire coordinate units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position3D {
    /// Latitude in 1/10 micro-degrees
    pub lat: i32,
    /// Longitude in 1/10 micro-degrees
    pub lon: i32,
    /// Elevation in decimeters, if known
    pub elevation: Option<i32>,
}

impl Position3D {
    /// Position without elevation.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
        }
    }

    /// Latitude in degrees.
    pub fn lat_degrees(&self) -> f64 {
        f64::from(self.lat) / COORDINATE_SCALE
    }

    /// Longitude in degrees.
    pub fn lon_degrees(&self) -> f64 {
        f64::from(self.lon) / COORDINATE_SCALE
    }
}

/// Rectangle a provider serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRegion {
    /// North-west corner
    pub nw_corner: Position3D,
    /// South-east corner
    pub se_corner: Position3D,
}

/// Service descriptor carried in registrations and discovery responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Where to reach the provider (at least one)
    pub connection_points: Vec<ConnectionPoint>,
    /// Provider identifier
    pub svc_provider: [u8; 4],
    /// Provider service identifiers (at least one)
    pub svc_psids: Vec<[u8; 4]>,
    /// Area the service covers
    pub service_region: GeoRegion,
}

/// Stored registration of a service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRegistrationData {
    /// Always `ObjReg` for well-formed registrations
    pub dialog_id: SemiDialogId,
    /// Sequence id
    pub seq_id: SemiSequenceId,
    /// Group id
    pub group_id: GroupId,
    /// Request id
    pub request_id: TemporaryId,
    /// Registered service
    pub service_record: ServiceRecord,
}

/// Service section of a discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Number of real records (0 when only the blank placeholder is present)
    pub count_records: u8,
    /// Records, 1..=10
    pub service_records: Vec<ServiceRecord>,
}

/// Discovery response sent back to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDiscoveryData {
    /// Always `ObjDisc`
    pub dialog_id: SemiDialogId,
    /// Always `Data`
    pub seq_id: SemiSequenceId,
    /// Echo of the request id
    pub request_id: TemporaryId,
    /// Echo of the group id
    pub group_id: GroupId,
    /// Matching services
    pub service_info: ServiceInfo,
}

/// Acknowledgement that a deposit was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReceipt {
    /// Dialog being acknowledged
    pub dialog_id: SemiDialogId,
    /// Always `Receipt`
    pub seq_id: SemiSequenceId,
    /// Group id
    pub group_id: GroupId,
    /// Request id
    pub request_id: TemporaryId,
}

/// Any message the codec understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemiMessage {
    /// Provider registration
    ObjectRegistration(ObjectRegistrationData),
    /// Discovery response
    ObjectDiscovery(ObjectDiscoveryData),
    /// Deposit receipt
    DataReceipt(DataReceipt),
}

impl SemiMessage {
    /// Short type name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ObjectRegistration(_) => "ObjectRegistrationData",
            Self::ObjectDiscovery(_) => "ObjectDiscoveryData",
            Self::DataReceipt(_) => "DataReceipt",
        }
    }
}
