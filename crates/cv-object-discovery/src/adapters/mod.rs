//! # Adapters Layer
//!
//! Concrete implementations of the driven ports, plus the TOML config loader.
//!
//! | Port | Adapter |
//! |------|---------|
//! | `WireCodec` | `BincodeCodec` |
//! | `RegistrationStore` | `InMemoryRegistrationStore` |
//! | `CertificateCrypto` | `RegistryCrypto` |
//! | `Transport` | `UdpTransport`, `NoOpTransport` |
//! | `ReceiptSink` | `ChannelReceiptSink`, `NoOpReceiptSink` |

pub mod codec;
pub mod config;
pub mod crypto;
pub mod receipts;
pub mod store;
pub mod transport;

pub use codec::BincodeCodec;
pub use config::{ConfigLoader, CONFIG_PATH_ENV};
pub use crypto::RegistryCrypto;
pub use receipts::{ChannelReceiptSink, NoOpReceiptSink};
pub use store::{registration_document, InMemoryRegistrationStore, SERVICE_ID_FIELD};
pub use transport::{forward_envelope, parse_forward_envelope, NoOpTransport, UdpTransport};
