//! Command correlator - one outbound URL, one callback.
//!
//! ```text
//!   Idle ──encode──► AwaitingCallback ──callback(success)──► Resolved
//!                        │  │  │
//!                        │  │  └──callback(error)──────────► Rejected(Callback)
//!                        │  └─────deadline──────────────────► Rejected(Timeout)
//!                        └────────invoker/listener failure──► Rejected(Transport)
//! ```
//!
//! Flow:
//! 1. Encode the request (validation errors never touch the network)
//! 2. Bind a dedicated callback listener for the exchange
//! 3. Build `bear://x-callback-url/<action>?..&x-success=..&x-error=..`
//! 4. Start the deadline and hand the URL to the [`ExternalInvoker`]
//! 5. Wait for the callback, the deadline or cancellation, whichever is first
//! 6. Close the listener and settle
//!
//! Every exchange owns its own port, so concurrent commands cannot receive
//! each other's callbacks and no table of pending exchanges is needed.

use crate::adapters::listener::{CallbackEndpoint, CallbackListener, CallbackOutcome};
use crate::domain::codec::{self, encode_spaces, CommandRequest, EncodedParameters};
use crate::domain::config::{BridgeConfig, ConfigError};
use crate::domain::correlation::ExchangeId;
use crate::domain::error::{BridgeError, BridgeResult, TransportError};
use crate::domain::payload::CallbackPayload;
use crate::domain::Action;
use crate::ports::outbound::ExternalInvoker;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::form_urlencoded;
use url::Url;

/// Counters for exchanges run by one correlator
#[derive(Debug, Default)]
pub struct ExchangeStats {
    pub started: AtomicU64,
    pub resolved: AtomicU64,
    pub callback_errors: AtomicU64,
    pub timeouts: AtomicU64,
    pub transport_failures: AtomicU64,
    pub cancelled: AtomicU64,
    /// Requests rejected by validation (no listener was opened)
    pub rejected: AtomicU64,
    pub listeners_opened: AtomicU64,
    pub in_flight: AtomicU64,
}

/// Point-in-time copy of [`ExchangeStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub started: u64,
    pub resolved: u64,
    pub callback_errors: u64,
    pub timeouts: u64,
    pub transport_failures: u64,
    pub cancelled: u64,
    pub rejected: u64,
    pub listeners_opened: u64,
    pub in_flight: u64,
}

impl ExchangeStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            callback_errors: self.callback_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            listeners_opened: self.listeners_opened.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Decrements `in_flight` however the exchange ends, including when the
/// caller drops the future.
struct InFlight<'a>(&'a AtomicU64);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

enum Settled {
    Received(Result<CallbackOutcome, TransportError>),
    TimedOut,
    Cancelled,
}

/// Runs command/callback exchanges against Bear.
pub struct CommandCorrelator {
    config: Arc<BridgeConfig>,
    invoker: Arc<dyn ExternalInvoker>,
    stats: Arc<ExchangeStats>,
}

impl CommandCorrelator {
    pub fn new(config: BridgeConfig, invoker: Arc<dyn ExternalInvoker>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            invoker,
            stats: Arc::new(ExchangeStats::default()),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Deadline applied to every exchange
    pub fn timeout(&self) -> Duration {
        self.config.timeouts.callback
    }

    pub fn stats(&self) -> &ExchangeStats {
        &self.stats
    }

    /// Outbound URL for an action, with both delivery channels pointing at
    /// `endpoint`.
    pub fn build_url(
        &self,
        action: Action,
        params: &EncodedParameters,
        endpoint: &CallbackEndpoint,
    ) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.config.action_base(action.name()))?;

        let delivery = form_urlencoded::Serializer::new(String::new())
            .append_pair("x-success", &endpoint.success_url())
            .append_pair("x-error", &endpoint.error_url())
            .finish();
        let delivery = encode_spaces(delivery);

        let query = if params.is_empty() {
            delivery
        } else {
            format!("{}&{}", params.to_query_string(), delivery)
        };
        url.set_query(Some(&query));
        Ok(url)
    }

    /// Run one exchange and return Bear's success payload.
    pub async fn execute(&self, request: CommandRequest) -> BridgeResult<CallbackPayload> {
        self.execute_with_cancel(request, std::future::pending::<()>())
            .await
    }

    /// Like [`execute`](Self::execute), but settles as `Cancelled` when
    /// `cancel` completes first.
    pub async fn execute_with_cancel<F>(
        &self,
        request: CommandRequest,
        cancel: F,
    ) -> BridgeResult<CallbackPayload>
    where
        F: Future<Output = ()>,
    {
        let action = request.action();
        let params = match codec::encode(&request) {
            Ok(params) => params,
            Err(e) => {
                bump(&self.stats.rejected);
                debug!(action = %action, error = %e, "Rejected command");
                return Err(e.into());
            }
        };

        let exchange_id = ExchangeId::new();
        let timeout = self.timeout();
        bump(&self.stats.started);

        let (endpoint, mut pending) =
            match CallbackListener::listen(&self.config.callback, exchange_id) {
                Ok(listener) => listener,
                Err(e) => {
                    bump(&self.stats.transport_failures);
                    warn!(exchange_id = %exchange_id, action = %action, error = %e, "Could not open callback listener");
                    return Err(e.into());
                }
            };
        bump(&self.stats.listeners_opened);
        let _in_flight = InFlight::enter(&self.stats.in_flight);

        let url = match self.build_url(action, &params, &endpoint) {
            Ok(url) => url,
            Err(e) => {
                pending.close().await;
                bump(&self.stats.transport_failures);
                return Err(e.into());
            }
        };

        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + timeout;
        info!(
            exchange_id = %exchange_id,
            action = %action,
            port = endpoint.port(),
            params = params.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Dispatching command"
        );

        match tokio::time::timeout_at(deadline, self.invoker.invoke(&url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                pending.close().await;
                bump(&self.stats.transport_failures);
                warn!(exchange_id = %exchange_id, action = %action, error = %e, "Dispatch failed");
                return Err(e.into());
            }
            Err(_) => {
                pending.close().await;
                bump(&self.stats.timeouts);
                warn!(exchange_id = %exchange_id, action = %action, "Dispatch did not return before the deadline");
                return Err(BridgeError::Timeout {
                    action,
                    after: timeout,
                });
            }
        }

        tokio::pin!(cancel);
        // Callback first: one that lands right at the deadline still wins.
        let settled = tokio::select! {
            biased;
            received = pending.recv() => Settled::Received(received),
            _ = &mut cancel => Settled::Cancelled,
            _ = tokio::time::sleep_until(deadline) => Settled::TimedOut,
        };
        pending.close().await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match settled {
            Settled::Received(Ok(CallbackOutcome::Success(payload))) => {
                bump(&self.stats.resolved);
                info!(
                    exchange_id = %exchange_id,
                    action = %action,
                    elapsed_ms,
                    fields = payload.len(),
                    "Command resolved"
                );
                Ok(payload)
            }
            Settled::Received(Ok(CallbackOutcome::Error(payload))) => {
                bump(&self.stats.callback_errors);
                warn!(
                    exchange_id = %exchange_id,
                    action = %action,
                    elapsed_ms,
                    error_code = %payload.error_code().unwrap_or_default(),
                    error_message = %payload.error_message().unwrap_or_default(),
                    "Bear answered on the error channel"
                );
                Err(BridgeError::Callback(payload))
            }
            Settled::Received(Err(e)) => {
                bump(&self.stats.transport_failures);
                warn!(exchange_id = %exchange_id, action = %action, error = %e, "Callback listener failed");
                Err(e.into())
            }
            Settled::TimedOut => {
                bump(&self.stats.timeouts);
                warn!(
                    exchange_id = %exchange_id,
                    action = %action,
                    timeout_ms = timeout.as_millis() as u64,
                    "No callback before the deadline"
                );
                Err(BridgeError::Timeout {
                    action,
                    after: timeout,
                })
            }
            Settled::Cancelled => {
                bump(&self.stats.cancelled);
                info!(exchange_id = %exchange_id, action = %action, elapsed_ms, "Command cancelled");
                Err(BridgeError::Cancelled { action })
            }
        }
    }
}
