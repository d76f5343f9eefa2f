//! Bridge error taxonomy.
//!
//! Four failure kinds reach the caller unchanged: validation (nothing was
//! sent), transport (the dispatch or the listener failed), timeout (no
//! callback before the deadline) and callback errors (Bear answered on its
//! error channel). Cancellation is a fifth, caller-driven outcome.
//!
//! Numeric codes follow the JSON-RPC 2.0 ranges so a protocol adapter can
//! forward them as-is.

use crate::domain::action::Action;
use crate::domain::payload::CallbackPayload;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// JSON-RPC style error codes
pub mod codes {
    pub const INVALID_PARAMS: i32 = -32602;
    pub const SERVER_ERROR: i32 = -32000;
    pub const RESOURCE_UNAVAILABLE: i32 = -32002;
    pub const TIMEOUT: i32 = -32006;
    pub const EXECUTION_ERROR: i32 = -32015;
}

/// Input rejected before any listener is opened or any process launched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{action}: missing required field '{field}'")]
    MissingField { action: Action, field: String },

    #[error("{action}: field '{field}' must not be empty")]
    EmptyField { action: Action, field: String },

    #[error("{action}: field '{field}' expects a boolean or yes/no, got '{value}'")]
    InvalidFlag {
        action: Action,
        field: String,
        value: String,
    },

    #[error("{action}: field '{field}' expects {expected}")]
    InvalidType {
        action: Action,
        field: String,
        expected: &'static str,
    },

    #[error("{action}: unknown field '{field}'")]
    UnknownField { action: Action, field: String },

    #[error("{action}: {requirement}")]
    MissingTarget {
        action: Action,
        requirement: &'static str,
    },

    #[error("{action}: targeting the selected note requires an API token")]
    MissingToken { action: Action },

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("parameters must be a JSON object")]
    NotAnObject,

    #[error("{action}: malformed parameters: {reason}")]
    Malformed { action: Action, reason: String },
}

/// Failure of the external process that hands the URL to the OS.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("invoker unavailable: {0}")]
    Unavailable(String),
}

/// Dispatch or listener failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind callback listener on {host}: {source}")]
    Bind {
        host: IpAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("callback listener failed: {0}")]
    Serve(String),

    #[error("callback listener closed before a callback arrived")]
    ListenerClosed,

    #[error("invalid invocation url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

/// Error kind, for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Transport,
    Timeout,
    Callback,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Callback => "callback",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every command.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("{action}: no callback within {}ms", .after.as_millis())]
    Timeout { action: Action, after: Duration },

    #[error(
        "Bear reported an error: {}",
        .0.error_message().unwrap_or_else(|| "unknown error".to_string())
    )]
    Callback(CallbackPayload),

    #[error("{action} was cancelled")]
    Cancelled { action: Action },
}

impl From<InvokeError> for BridgeError {
    fn from(e: InvokeError) -> Self {
        BridgeError::Transport(TransportError::Invoke(e))
    }
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Validation(_) => ErrorKind::Validation,
            BridgeError::Transport(_) => ErrorKind::Transport,
            BridgeError::Timeout { .. } => ErrorKind::Timeout,
            BridgeError::Callback(_) => ErrorKind::Callback,
            BridgeError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Timeouts and transport failures are plausibly transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::Transport)
    }

    pub fn code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation => codes::INVALID_PARAMS,
            ErrorKind::Transport => codes::RESOURCE_UNAVAILABLE,
            ErrorKind::Timeout => codes::TIMEOUT,
            ErrorKind::Callback => codes::EXECUTION_ERROR,
            ErrorKind::Cancelled => codes::SERVER_ERROR,
        }
    }

    /// Payload Bear sent on its error channel, if this is a callback error.
    pub fn callback_payload(&self) -> Option<&CallbackPayload> {
        match self {
            BridgeError::Callback(payload) => Some(payload),
            _ => None,
        }
    }

    /// `{kind, code, message, data?}` object for protocol adapters.
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Some(payload) = self.callback_payload() {
            body["data"] = serde_json::Value::from(payload.clone());
        }
        body
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_codes() {
        let err = BridgeError::from(ValidationError::MissingField {
            action: Action::GrabUrl,
            field: "url".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), codes::INVALID_PARAMS);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("grab-url"));
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = BridgeError::Timeout {
            action: Action::Create,
            after: Duration::from_secs(10),
        };
        assert!(err.is_retryable());
        assert_eq!(err.code(), codes::TIMEOUT);
        assert!(err.to_string().contains("10000ms"));
    }

    #[test]
    fn test_invoke_error_is_transport() {
        let err = BridgeError::from(InvokeError::ExitStatus {
            program: "open".into(),
            status: "exit status: 1".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_callback_error_json_carries_payload() {
        let payload = CallbackPayload::from_query("errorCode=3&errorMessage=Note%20not%20found");
        let err = BridgeError::Callback(payload);
        assert_eq!(err.to_string(), "Bear reported an error: Note not found");

        let json = err.to_json();
        assert_eq!(json["kind"], "callback");
        assert_eq!(json["code"], codes::EXECUTION_ERROR);
        assert_eq!(json["data"]["errorCode"], 3);
    }
}
