//! Telemetry configuration from environment variables.

use std::env;

/// Variable holding the log filter; `RUST_LOG` is the fallback
pub const ENV_LOG: &str = "BEAR_BRIDGE_LOG";
/// Variable switching to JSON log lines
pub const ENV_JSON_LOGS: &str = "BEAR_BRIDGE_JSON_LOGS";

/// Logging configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup line
    pub service_name: String,

    /// `EnvFilter` directive (trace, debug, info, warn, error, or per-target)
    pub log_level: String,

    /// Emit one JSON object per line instead of human-readable text
    pub json_logs: bool,

    /// ANSI colours in text mode
    pub ansi: bool,

    /// Include file and line of each event
    pub with_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "bear-bridge".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
            with_location: false,
        }
    }
}

fn truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes")
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BEAR_BRIDGE_LOG` or `RUST_LOG`: Log filter (default: info)
    /// - `BEAR_BRIDGE_JSON_LOGS`: JSON output (default: false)
    /// - `NO_COLOR`: Disable ANSI colours when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let json_logs = lookup(ENV_JSON_LOGS).map(|v| truthy(&v)).unwrap_or(false);

        Self {
            log_level: lookup(ENV_LOG)
                .or_else(|| lookup("RUST_LOG"))
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            json_logs,
            ansi: !json_logs && lookup("NO_COLOR").is_none(),
            with_location: json_logs,
            ..defaults
        }
    }

    /// Same configuration with a different service name.
    pub fn for_service(mut self, name: &str) -> Self {
        self.service_name = name.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::from_lookup(lookup(&[]));
        assert_eq!(config.service_name, "bear-bridge");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert!(config.ansi);
    }

    #[test]
    fn test_bridge_variable_wins_over_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("BEAR_BRIDGE_LOG", "bear_xcallback=debug"),
        ]));
        assert_eq!(config.log_level, "bear_xcallback=debug");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_json_logs_disable_ansi() {
        let config = TelemetryConfig::from_lookup(lookup(&[("BEAR_BRIDGE_JSON_LOGS", "1")]));
        assert!(config.json_logs);
        assert!(!config.ansi);
        assert!(config.with_location);
    }

    #[test]
    fn test_for_service() {
        let config = TelemetryConfig::default().for_service("bear-bridge-test");
        assert_eq!(config.service_name, "bear-bridge-test");
    }
}
