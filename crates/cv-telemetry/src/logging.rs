//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` fmt subscriber. Human-readable by
//! default; JSON when `json_logs` is set so a log shipper can parse:
//! - `timestamp`, `level`, `target`
//! - `fields.message` plus structured fields (`request_id`, `attempt`, ...)
//! - `span` with the per-request `correlation_id`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the level filter for `config`.
pub(crate) fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::InvalidFilter {
        directive: config.log_level.clone(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// - `TelemetryError::InvalidFilter` if `log_level` is not a valid directive
/// - `TelemetryError::SubscriberInit` if a global subscriber already exists
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let result = if config.json_logs {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}
