//! Error types for the discovery pipeline

use thiserror::Error;

/// Inbound request could not be parsed or failed validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("Failed to parse discovery request: {0}")]
    Parse(String),

    #[error("Invalid dialogId {actual} for DiscoveryDataRequest, expected {expected}")]
    DialogMismatch { actual: i64, expected: i64 },

    #[error("Destination host/port is missing, ignoring data request")]
    MissingDestination,

    #[error("Missing {corner} position object")]
    MissingCorner { corner: &'static str },

    #[error("{field} is required")]
    Unset { field: &'static str },

    #[error("{field} {value} is not a valid {kind} value")]
    OutOfRange {
        field: &'static str,
        value: f64,
        kind: &'static str,
    },
}

/// Corner pair does not form a valid bounding box.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    #[error("{field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Northwest latitude {nw} is south of southeast latitude {se}")]
    LatitudeInverted { nw: f64, se: f64 },

    #[error("Northwest longitude {nw} is east of southeast longitude {se}")]
    LongitudeInverted { nw: f64, se: f64 },
}

/// Registration store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Store query timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Store connection error: {0}")]
    Connection(String),
}

/// Wire codec failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encode failed: {0}")]
    Encode(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Constraint violated: {field} has {actual}, allowed {allowed}")]
    Constraint {
        field: &'static str,
        actual: usize,
        allowed: &'static str,
    },
}

/// Stored record could not be turned into a registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Decoded fine but is another message type. Skipped by the decoder, never surfaced.
    #[error("Encoded message is not of type ObjectRegistrationData: {found}")]
    TypeMismatch { found: &'static str },

    #[error("Invalid base64 in stored record: {0}")]
    Base64(String),

    #[error("Stored record decode fault: {0}")]
    Codec(#[from] CodecError),
}

/// Datagram transport failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Unable to resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    #[error("Send timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Send failed: {0}")]
    Io(String),
}

/// Response could not be delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to serialize discovery response: {0}")]
    Serialization(#[source] CodecError),

    #[error("Failed to encrypt discovery response: {0}")]
    Encryption(String),

    #[error("Failed to send discovery response after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },
}

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Any failure while handling one discovery request.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

}

impl DiscoveryError {
    /// Whether the request was rejected before any store query.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Geo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_name_the_field() {
        let err = RequestError::Unset { field: "nwPos.lat" };
        assert_eq!(err.to_string(), "nwPos.lat is required");

        let err = RequestError::OutOfRange {
            field: "sePos.lon",
            value: 200.0,
            kind: "Longitude",
        };
        assert_eq!(err.to_string(), "sePos.lon 200 is not a valid Longitude value");
    }

    #[test]
    fn test_exhausted_keeps_last_error_as_source() {
        let err = DispatchError::Exhausted {
            attempts: 3,
            last: TransportError::Io("connection refused".into()),
        };
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Send failed: connection refused"));
    }

    #[test]
    fn test_rejection_classification() {
        let rejected: DiscoveryError = RequestError::MissingDestination.into();
        assert!(rejected.is_rejection());

        let store: DiscoveryError = StoreError::Timeout { after_ms: 5 }.into();
        assert!(!store.is_rejection());
    }
}
