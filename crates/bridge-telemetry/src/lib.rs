//! # Bridge Telemetry
//!
//! Structured logging for the Bear bridge, built on `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! tracing::info!("ready");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BEAR_BRIDGE_LOG` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `BEAR_BRIDGE_JSON_LOGS` | `false` | One JSON object per log line |
//! | `NO_COLOR` | unset | Disable ANSI colours |

#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod logging;

pub use config::{TelemetryConfig, ENV_JSON_LOGS, ENV_LOG};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter {0}")]
    Filter(String),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global `tracing` subscriber described by `config`.
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)?;

    tracing::debug!(
        service = %config.service_name,
        filter = %config.log_level,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}
