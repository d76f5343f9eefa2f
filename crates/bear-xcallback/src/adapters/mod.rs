//! Adapters: the HTTP callback listener and the process-based URL invoker.

pub mod invoker;
pub mod listener;

pub use invoker::OpenUrlInvoker;
pub use listener::{CallbackEndpoint, CallbackListener, CallbackOutcome, PendingCallback};
