//! # Record Decoder
//!
//! Turns stored documents into `ObjectRegistrationData`.
//!
//! | Document | Result |
//! |----------|--------|
//! | no `encodedMsg` string | skipped silently |
//! | decodes to another message type | `debug!`, skipped |
//! | bad base64 or codec fault | error, aborts the batch |

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::domain::{DecodeError, ObjectRegistrationData, SemiMessage};
use crate::ports::{RawRecord, WireCodec};

/// Document field carrying the base64 registration message.
pub const ENCODED_MSG_FIELD: &str = "encodedMsg";

/// Decodes store documents with a shared codec.
#[derive(Clone)]
pub struct RecordDecoder {
    codec: Arc<dyn WireCodec>,
}

impl RecordDecoder {
    pub fn new(codec: Arc<dyn WireCodec>) -> Self {
        Self { codec }
    }

    /// Decode one document. `Ok(None)` means it carries no encoded message.
    ///
    /// # Errors
    ///
    /// `DecodeError::TypeMismatch` for other message types, `Base64` or
    /// `Codec` for faults.
    pub fn decode_one(&self, raw: &RawRecord) -> Result<Option<ObjectRegistrationData>, DecodeError> {
        let Some(encoded) = raw.get(ENCODED_MSG_FIELD).and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DecodeError::Base64(e.to_string()))?;

        match self.codec.decode(&bytes)? {
            SemiMessage::ObjectRegistration(data) => Ok(Some(data)),
            other => Err(DecodeError::TypeMismatch { found: other.kind() }),
        }
    }

    /// Decode a batch, preserving order.
    ///
    /// # Errors
    ///
    /// The first base64 or codec fault. Type mismatches are skipped.
    pub fn decode_all(&self, raw: &[RawRecord]) -> Result<Vec<ObjectRegistrationData>, DecodeError> {
        let mut records = Vec::with_capacity(raw.len());
        for document in raw {
            match self.decode_one(document) {
                Ok(Some(data)) => records.push(data),
                Ok(None) => {}
                Err(DecodeError::TypeMismatch { found }) => {
                    debug!(found, "Encoded message is not of type ObjectRegistrationData, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }
}
