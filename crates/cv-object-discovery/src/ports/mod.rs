//! # Ports Layer
//!
//! - **Driving port (inbound):** `DiscoveryApi`, what the runtime calls
//! - **Driven ports (outbound):** store, codec, crypto, transport and receipt
//!   boundaries the pipeline needs adapters for
//!
//! Every driven port is object safe and `Send + Sync`; the service holds
//! them as `Arc<dyn ...>` built once at startup.

pub mod inbound;
pub mod outbound;

pub use inbound::{DiscoveryApi, DispatchReport, Outcome, Protection};
pub use outbound::{
    CertificateCrypto, Destination, RawRecord, Receipt, ReceiptSink, RegionQuery,
    RegistrationStore, Transport, WireCodec,
};
