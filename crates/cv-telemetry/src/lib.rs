//! # CV Telemetry
//!
//! Logging setup for the object discovery service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cv_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config)?;
//!     // Spans and events now reach stdout
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `cv-object-discovery` | Service name stamped on every log line |
//! | `CV_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CV_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |

#![warn(missing_docs)]

mod config;
mod context;
mod logging;

pub use config::TelemetryConfig;
pub use context::RequestContext;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive did not parse.
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// Directive as given.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}
