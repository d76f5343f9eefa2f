//! Domain types for the bridge.
//!
//! Actions, the parameter codec, callback payloads, configuration and the
//! error taxonomy. Nothing in here performs I/O.

pub mod action;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod error;
pub mod payload;

// Re-exports for convenience
pub use action::{Action, FieldKind, FieldSpec, TokenPolicy};
pub use codec::{encode, CommandRequest, EncodedParameters, ParamValue};
pub use config::{BridgeConfig, ConfigError};
pub use correlation::ExchangeId;
pub use error::{BridgeError, BridgeResult, ErrorKind, InvokeError, TransportError, ValidationError};
pub use payload::{CallbackPayload, NoteSummary, TagSummary};
