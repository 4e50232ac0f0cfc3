//! # In-Memory Registration Store
//!
//! `RegistrationStore` over a vector of JSON documents. A document matches
//! when its `serviceId` equals the query's and the bounding rectangle of its
//! region polygon intersects the query polygon's rectangle.
//!
//! Documents look like what the registration writer stores:
//!
//! ```json
//! {
//!   "serviceId": 5,
//!   "timestamp": 1700000000000,
//!   "region": {"type": "Polygon", "coordinates": [[[1.0, -10.0], ...]]},
//!   "encodedMsg": "<base64 ObjectRegistrationData>"
//! }
//! ```

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::{
    BoundingBox, CodecError, GeoRect, LatLon, ObjectRegistrationData, SemiMessage, StoreError,
    TIMESTAMP_FIELD,
};
use crate::ports::{RawRecord, RegionQuery, RegistrationStore, WireCodec};
use crate::service::ENCODED_MSG_FIELD;

/// Document field holding the provider's service id.
pub const SERVICE_ID_FIELD: &str = "serviceId";

/// Concurrent-read document store.
#[derive(Default)]
pub struct InMemoryRegistrationStore {
    documents: RwLock<Vec<RawRecord>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `documents`.
    pub fn with_documents(documents: Vec<RawRecord>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Load a JSON array of documents from `path`.
    ///
    /// # Errors
    ///
    /// `StoreError::Connection` if the file cannot be read, is not a JSON
    /// array, or holds non-object entries.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Connection(format!("{}: {e}", path.display())))?;
        let documents: Vec<RawRecord> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Connection(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), documents = documents.len(), "Seeded registration store");
        Ok(Self::with_documents(documents))
    }

    /// Append a document.
    pub fn insert(&self, document: RawRecord) {
        self.documents.write().push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

fn matches(document: &RawRecord, query: &RegionQuery, query_rect: &GeoRect) -> bool {
    let service_matches = document
        .get(SERVICE_ID_FIELD)
        .and_then(Value::as_i64)
        .is_some_and(|id| id == query.service_id);
    if !service_matches {
        return false;
    }
    document
        .get(&query.geo_field)
        .and_then(GeoRect::from_geometry)
        .is_some_and(|region| region.intersects(query_rect))
}

fn sort_key(document: &RawRecord, field: &str) -> Option<f64> {
    document.get(field).and_then(Value::as_f64)
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn find_all(&self, query: &RegionQuery) -> Result<Vec<RawRecord>, StoreError> {
        let query_rect = query.polygon.rect();
        let mut found: Vec<RawRecord> = self
            .documents
            .read()
            .iter()
            .filter(|d| matches(d, query, &query_rect))
            .cloned()
            .collect();

        // stable: equal keys keep insertion order, missing keys first
        found.sort_by(|a, b| {
            match (sort_key(a, &query.sort_field), sort_key(b, &query.sort_field)) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        found.truncate(query.limit);

        debug!(
            database = %query.database,
            collection = %query.collection,
            service_id = query.service_id,
            matched = found.len(),
            "In-memory region query"
        );
        Ok(found)
    }
}

/// Build the stored document for a registration: encodes it, base64s the
/// bytes and derives the region polygon from the service region.
///
/// # Errors
///
/// Returns the codec's error if the registration does not encode.
pub fn registration_document(
    codec: &dyn WireCodec,
    service_id: i64,
    geo_field: &str,
    registration: &ObjectRegistrationData,
    timestamp: i64,
) -> Result<RawRecord, CodecError> {
    let bytes = codec.encode(&SemiMessage::ObjectRegistration(registration.clone()))?;
    let region = &registration.service_record.service_region;
    let nw = LatLon::new(region.nw_corner.lat_degrees(), region.nw_corner.lon_degrees());
    let se = LatLon::new(region.se_corner.lat_degrees(), region.se_corner.lon_degrees());
    let geometry = BoundingBox::new(nw, se)
        .map(|bb| bb.to_polygon().to_geometry())
        .map_err(|e| CodecError::Encode(format!("service region: {e}")))?;

    let mut document = RawRecord::new();
    document.insert(SERVICE_ID_FIELD.to_string(), json!(service_id));
    document.insert(TIMESTAMP_FIELD.to_string(), json!(timestamp));
    document.insert(geo_field.to_string(), geometry);
    document.insert(ENCODED_MSG_FIELD.to_string(), json!(STANDARD.encode(bytes)));
    Ok(document)
}
