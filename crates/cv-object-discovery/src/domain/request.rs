//! # Discovery Request
//!
//! Inbound query parsed from the upstream JSON document.
//!
//! ## Validation Rules
//!
//! - `destHost` present and not blank, `destPort` non-zero
//! - both `nwPos` and `sePos` present
//! - latitude in [-90, 90], longitude in [-180, 180]
//! - no coordinate exactly 0: existing producers leave unset coordinates
//!   at 0, so 0 means "missing" (equator and prime meridian cannot be queried)

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::errors::RequestError;
use crate::domain::geo::LatLon;
use crate::domain::messages::SemiDialogId;

/// Dialog id every discovery request must carry.
pub const DISCOVERY_DIALOG_ID: i64 = SemiDialogId::ObjDisc.value();

/// Read `dialogId` without parsing the rest of the document.
///
/// # Errors
///
/// Returns `RequestError::Parse` if `raw` is not a JSON object with an
/// integer `dialogId`.
pub fn peek_dialog_id(raw: &str) -> Result<i64, RequestError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| RequestError::Parse(e.to_string()))?;
    value
        .get("dialogId")
        .and_then(Value::as_i64)
        .ok_or_else(|| RequestError::Parse("dialogId is missing or not an integer".into()))
}

/// Parsed discovery request. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    #[serde(default)]
    pub dialog_id: i64,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub sequence_id: i32,
    #[serde(default)]
    pub group_id: i32,
    #[serde(default)]
    pub request_id: i32,
    #[serde(default)]
    pub service_id: i64,
    #[serde(default)]
    pub dest_host: Option<String>,
    #[serde(default)]
    pub dest_port: u16,
    /// Whether an upstream forwarder relayed this request.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub from_forwarder: bool,
    /// Base64 recipient certificate; the response is encrypted for it when present.
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub nw_pos: Option<LatLon>,
    #[serde(default)]
    pub se_pos: Option<LatLon>,
}

/// Producers send `fromForwarder` as `"true"`/`"false"` strings; accept booleans too.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
        None => false,
    })
}

fn validate_lat(field: &'static str, lat: f64) -> Result<(), RequestError> {
    if lat == 0.0 {
        return Err(RequestError::Unset { field });
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(RequestError::OutOfRange {
            field,
            value: lat,
            kind: "Latitude",
        });
    }
    Ok(())
}

fn validate_lon(field: &'static str, lon: f64) -> Result<(), RequestError> {
    if lon == 0.0 {
        return Err(RequestError::Unset { field });
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(RequestError::OutOfRange {
            field,
            value: lon,
            kind: "Longitude",
        });
    }
    Ok(())
}

impl DiscoveryRequest {
    /// Parse an inbound JSON document. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Parse` on malformed JSON or mistyped fields.
    pub fn from_json(raw: &str) -> Result<Self, RequestError> {
        serde_json::from_str(raw).map_err(|e| RequestError::Parse(e.to_string()))
    }

    /// Whether this request belongs to the object discovery dialog.
    pub fn is_discovery_dialog(&self) -> bool {
        self.dialog_id == DISCOVERY_DIALOG_ID
    }

    /// Check the request before any store query.
    ///
    /// # Errors
    ///
    /// The first failing rule, naming the offending field.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.is_discovery_dialog() {
            return Err(RequestError::DialogMismatch {
                actual: self.dialog_id,
                expected: DISCOVERY_DIALOG_ID,
            });
        }

        let host_missing = self
            .dest_host
            .as_deref()
            .map_or(true, |h| h.trim().is_empty());
        if host_missing || self.dest_port == 0 {
            return Err(RequestError::MissingDestination);
        }

        let nw = self
            .nw_pos
            .ok_or(RequestError::MissingCorner { corner: "northwest" })?;
        validate_lat("nwPos.lat", nw.lat)?;
        validate_lon("nwPos.lon", nw.lon)?;

        let se = self
            .se_pos
            .ok_or(RequestError::MissingCorner { corner: "southeast" })?;
        validate_lat("sePos.lat", se.lat)?;
        validate_lon("sePos.lon", se.lon)?;

        Ok(())
    }

    /// Destination host, trimmed. Empty if absent.
    pub fn dest_host(&self) -> &str {
        self.dest_host.as_deref().map(str::trim).unwrap_or_default()
    }
}
