#![allow(missing_docs)]

//! Bear x-callback-url bridge - typed commands in, correlated payloads out.
//!
//! Bear only talks through fire-and-forget `bear://x-callback-url/<action>`
//! invocations and answers, if at all, by opening a second URL. This crate
//! turns that into an ordinary async request/response call.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          BearClient (façade)                         │
//! │   typed params → target checks → token policy → CommandRequest       │
//! └──────────────────────────────┬───────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────────────┐
//! │                         CommandCorrelator                            │
//! │  encode → listen(127.0.0.1:0) → build URL → invoke → await | deadline│
//! └──────┬────────────────────────┬───────────────────────┬──────────────┘
//!        │                        │                       │
//!  ┌─────┴──────┐       ┌─────────┴─────────┐     ┌───────┴────────┐
//!  │   Codec    │       │ CallbackListener  │     │ ExternalInvoker│
//!  │ yes/no,    │       │ axum, one shot,   │     │ `open -g <url>`│
//!  │ a,b,c      │       │ /<id>/success|err │     │                │
//!  └────────────┘       └─────────▲─────────┘     └───────┬────────┘
//!                                 │                       │
//!                                 └──────── Bear ◄────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bear_xcallback::{BearClient, BridgeConfig, CreateNoteParams, OpenUrlInvoker};
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::from_env()?;
//! let invoker = Arc::new(OpenUrlInvoker::from_config(&config.invoker));
//! let client = BearClient::new(config, invoker)?;
//!
//! let note = client
//!     .create_note(CreateNoteParams {
//!         title: Some("Meeting Notes".into()),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", note.identifier().unwrap_or_default());
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod facade;
pub mod ports;
pub mod service;

pub use adapters::{CallbackEndpoint, CallbackListener, CallbackOutcome, OpenUrlInvoker, PendingCallback};
pub use domain::{
    encode, Action, BridgeConfig, BridgeError, BridgeResult, CallbackPayload, CommandRequest,
    ConfigError, EncodedParameters, ErrorKind, ExchangeId, InvokeError, NoteSummary, ParamValue,
    TagSummary, TokenPolicy, TransportError, ValidationError,
};
pub use facade::{
    find_operation, ActionParams, AddFileParams, AddTextParams, BearClient, CreateNoteParams,
    DeleteTagParams, FilteredViewParams, GrabUrlParams, LockedParams, NoteTargetParams,
    OpenNoteParams, OpenTagParams, Operation, RenameTagParams, SearchParams, TagsParams, TextMode,
    OPERATIONS,
};
pub use ports::ExternalInvoker;
pub use service::{CommandCorrelator, ExchangeStats, StatsSnapshot};
