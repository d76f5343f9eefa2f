//! Outbound ports for the bridge.

use crate::domain::error::InvokeError;
use async_trait::async_trait;
use url::Url;

/// Hands an x-callback-url to the operating system.
///
/// Success only means the dispatch was attempted; whether Bear acted on the
/// URL is learned from the callback, if one arrives.
#[async_trait]
pub trait ExternalInvoker: Send + Sync {
    async fn invoke(&self, url: &Url) -> Result<(), InvokeError>;
}
