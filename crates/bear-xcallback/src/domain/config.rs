//! Bridge configuration with validation.
//!
//! Defaults suit a local Bear install on macOS. Values can come from a JSON
//! file and are then overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Deadline for a callback when nothing else is configured
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Query size above which a callback is logged as unusually large
pub const DEFAULT_LARGE_PAYLOAD_BYTES: usize = 100_000;

/// Environment variable naming a JSON config file
pub const ENV_CONFIG_FILE: &str = "BEAR_BRIDGE_CONFIG";
pub const ENV_TOKEN: &str = "BEAR_API_TOKEN";
pub const ENV_TIMEOUT: &str = "BEAR_BRIDGE_TIMEOUT";
pub const ENV_OPEN_PROGRAM: &str = "BEAR_BRIDGE_OPEN_PROGRAM";
pub const ENV_BIND_HOST: &str = "BEAR_BRIDGE_BIND_HOST";

/// Main bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Where outbound invocations are addressed
    pub target: TargetConfig,
    /// Callback listener settings
    pub callback: CallbackConfig,
    /// Deadlines
    pub timeouts: TimeoutConfig,
    /// External process used to open URLs
    pub invoker: InvokerConfig,
    /// Bear API token
    pub auth: AuthConfig,
}

impl BridgeConfig {
    /// Load from `BEAR_BRIDGE_CONFIG` (if set) and apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(ENV_CONFIG_FILE) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file. Missing sections keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        info!(path = %path.display(), "Loaded bridge configuration file");
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.auth.token = Some(token.trim().to_string());
        }

        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.timeouts.callback =
                humantime_serde::parse_duration(&raw).map_err(|reason| ConfigError::Env {
                    var: ENV_TIMEOUT,
                    reason: reason.to_string(),
                })?;
        }

        if let Some(program) = lookup(ENV_OPEN_PROGRAM) {
            self.invoker.program = program;
        }

        if let Some(raw) = lookup(ENV_BIND_HOST) {
            self.callback.bind_host = raw.parse().map_err(|_| ConfigError::Env {
                var: ENV_BIND_HOST,
                reason: format!("'{}' is not an IP address", raw),
            })?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeouts.callback.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "callback timeout cannot be 0".into(),
            ));
        }

        if self.target.scheme.trim().is_empty() {
            return Err(ConfigError::InvalidTarget("scheme cannot be empty".into()));
        }

        if self.target.host.trim().is_empty() {
            return Err(ConfigError::InvalidTarget("host cannot be empty".into()));
        }

        if self.invoker.program.trim().is_empty() {
            return Err(ConfigError::InvalidInvoker(
                "program cannot be empty".into(),
            ));
        }

        if !self.callback.bind_host.is_loopback() && !self.callback.allow_external {
            return Err(ConfigError::ExternalBind(self.callback.bind_host));
        }

        Ok(())
    }

    /// Base URL for an action, e.g. `bear://x-callback-url/create`
    pub fn action_base(&self, action: &str) -> String {
        format!("{}://{}/{}", self.target.scheme, self.target.host, action)
    }
}

/// Outbound URL target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// URL scheme registered by the app (default: bear)
    pub scheme: String,
    /// Host part of the x-callback-url (default: x-callback-url)
    pub host: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            scheme: "bear".to_string(),
            host: "x-callback-url".to_string(),
        }
    }
}

/// Callback listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// Bind address (loopback unless `allow_external`)
    pub bind_host: IpAddr,
    /// Allow binding a non-loopback address (DANGER)
    pub allow_external: bool,
    /// Query size that triggers a warning
    pub large_payload_warn_bytes: usize,
    /// How long a closing listener may take to flush its acknowledgement
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            allow_external: false,
            large_payload_warn_bytes: DEFAULT_LARGE_PAYLOAD_BYTES,
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for Bear's callback (default: 10s)
    #[serde(with = "humantime_serde")]
    pub callback: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            callback: DEFAULT_CALLBACK_TIMEOUT,
        }
    }
}

/// External invoker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Program that hands a URL to the OS (default: open)
    pub program: String,
    /// Arguments placed before the URL (default: -g, keep Bear in the background)
    pub args: Vec<String>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            program: "open".to_string(),
            args: vec!["-g".to_string()],
        }
    }
}

/// Bear API token. Read-only after startup.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid invoker: {0}")]
    InvalidInvoker(String),

    #[error("refusing to bind callback listener on non-loopback address {0}")]
    ExternalBind(IpAddr),

    #[error("invalid value in {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Plain number means seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
