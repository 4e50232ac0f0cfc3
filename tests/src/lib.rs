//! # CV Object Discovery Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (request path, fold, encryption)
//! └── src/integration/
//!     ├── flows.rs      # Pipeline over the real adapters, in process
//!     └── e2e_udp.rs    # Runtime over real sockets
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cv-tests
//! cargo test -p cv-tests integration::e2e_udp
//! cargo bench -p cv-tests
//! ```

pub mod integration;
