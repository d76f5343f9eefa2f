//! Ports of the bridge.

pub mod outbound;

pub use outbound::ExternalInvoker;
