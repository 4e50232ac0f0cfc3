//! # Bincode Wire Codec
//!
//! `WireCodec` over bincode. The enum tag of `SemiMessage` identifies the
//! message type, so any payload decodes to whichever type it holds.
//!
//! Size constraints of the discovery schema are checked in both directions:
//!
//! | Field | Allowed |
//! |-------|---------|
//! | `service_records` | 1..=10 |
//! | `count_records` | 0..=10 and not above `service_records.len()` |
//! | `connection_points` | at least 1 |
//! | `svc_psids` | at least 1 |

use crate::domain::{CodecError, SemiMessage, ServiceRecord, MAX_SERVICE_RECORDS};
use crate::ports::WireCodec;

/// Upper bound on a decoded payload, guards against length-prefix bombs.
const MAX_MESSAGE_BYTES: u64 = 64 * 1024;

/// Bincode-backed codec. Stateless; share one instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl BincodeCodec {
    pub fn new() -> Self {
        Self
    }
}

fn check_service_record(record: &ServiceRecord) -> Result<(), CodecError> {
    if record.connection_points.is_empty() {
        return Err(CodecError::Constraint {
            field: "connection_points",
            actual: 0,
            allowed: "1..",
        });
    }
    if record.svc_psids.is_empty() {
        return Err(CodecError::Constraint {
            field: "svc_psids",
            actual: 0,
            allowed: "1..",
        });
    }
    Ok(())
}

fn check_constraints(message: &SemiMessage) -> Result<(), CodecError> {
    match message {
        SemiMessage::ObjectRegistration(data) => check_service_record(&data.service_record),
        SemiMessage::ObjectDiscovery(data) => {
            let info = &data.service_info;
            let records = info.service_records.len();
            if !(1..=MAX_SERVICE_RECORDS).contains(&records) {
                return Err(CodecError::Constraint {
                    field: "service_records",
                    actual: records,
                    allowed: "1..=10",
                });
            }
            let count = usize::from(info.count_records);
            if count > MAX_SERVICE_RECORDS || count > records {
                return Err(CodecError::Constraint {
                    field: "count_records",
                    actual: count,
                    allowed: "0..=service_records",
                });
            }
            info.service_records.iter().try_for_each(check_service_record)
        }
        SemiMessage::DataReceipt(_) => Ok(()),
    }
}

impl WireCodec for BincodeCodec {
    fn encode(&self, message: &SemiMessage) -> Result<Vec<u8>, CodecError> {
        check_constraints(message)?;
        bincode::serialize(message).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<SemiMessage, CodecError> {
        use bincode::Options;

        let message: SemiMessage = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(MAX_MESSAGE_BYTES)
            .deserialize(bytes)
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        check_constraints(&message)?;
        Ok(message)
    }
}
