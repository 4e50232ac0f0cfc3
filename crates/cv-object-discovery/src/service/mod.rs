//! # Service Layer
//!
//! Wires the domain to the ports: `ObjectDiscoveryService` orchestrates,
//! `RecordDecoder` reads stored records, `SecureDispatcher` delivers.

mod core;
pub mod decoder;
pub mod dispatcher;

pub use self::core::{DiscoveryPorts, ObjectDiscoveryService};
pub use decoder::{RecordDecoder, ENCODED_MSG_FIELD};
pub use dispatcher::SecureDispatcher;
