//! Single-use callback listener.
//!
//! Binds an OS-assigned port on the loopback interface and serves exactly
//! one callback for one exchange:
//!
//! ```text
//!   GET /<exchange-id>/success?identifier=..&title=..   -> Success(payload)
//!   GET /<exchange-id>/error?errorCode=..&errorMessage=.. -> Error(payload)
//! ```
//!
//! The first matching request is acknowledged with `200 OK`, decoded, handed
//! to the waiting [`PendingCallback`] and the server shuts down. Requests for
//! another exchange id or an unknown path get `404` and do not use up the
//! single shot. Later requests that still reach the socket get `410`.

use crate::domain::config::CallbackConfig;
use crate::domain::correlation::ExchangeId;
use crate::domain::error::TransportError;
use crate::domain::payload::CallbackPayload;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Path segment of the success channel
pub const SUCCESS_PATH: &str = "success";
/// Path segment of the error channel
pub const ERROR_PATH: &str = "error";

/// What Bear sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Success(CallbackPayload),
    Error(CallbackPayload),
}

impl CallbackOutcome {
    pub fn payload(&self) -> &CallbackPayload {
        match self {
            CallbackOutcome::Success(p) | CallbackOutcome::Error(p) => p,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallbackOutcome::Success(_))
    }
}

type Delivery = Result<CallbackOutcome, TransportError>;

/// Address Bear should call back, for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackEndpoint {
    addr: SocketAddr,
    exchange_id: ExchangeId,
}

impl CallbackEndpoint {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    /// Value for `x-success`
    pub fn success_url(&self) -> String {
        self.channel_url(SUCCESS_PATH)
    }

    /// Value for `x-error`
    pub fn error_url(&self) -> String {
        self.channel_url(ERROR_PATH)
    }

    fn channel_url(&self, channel: &str) -> String {
        format!("http://{}/{}/{}", self.addr, self.exchange_id, channel)
    }
}

struct ListenerState {
    exchange_id: ExchangeId,
    delivery: Mutex<Option<oneshot::Sender<Delivery>>>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    large_payload_warn_bytes: usize,
}

impl ListenerState {
    fn deliver(&self, delivery: Delivery) -> bool {
        match self.delivery.lock().take() {
            Some(tx) => tx.send(delivery).is_ok(),
            None => false,
        }
    }

    fn trigger_shutdown(&self) {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(());
        }
    }
}

/// Factory for single-use listeners.
pub struct CallbackListener;

impl CallbackListener {
    /// Bind a fresh listener for `exchange_id`.
    ///
    /// The socket is bound and accepting when this returns, so the endpoint
    /// can be embedded in the outbound URL without racing the callback.
    /// Must be called from within a tokio runtime.
    pub fn listen(
        config: &CallbackConfig,
        exchange_id: ExchangeId,
    ) -> Result<(CallbackEndpoint, PendingCallback), TransportError> {
        let bind_err = |source| TransportError::Bind {
            host: config.bind_host,
            source,
        };

        let std_listener =
            std::net::TcpListener::bind(SocketAddr::new(config.bind_host, 0)).map_err(bind_err)?;
        std_listener.set_nonblocking(true).map_err(bind_err)?;
        let addr = std_listener.local_addr().map_err(bind_err)?;
        let listener = tokio::net::TcpListener::from_std(std_listener).map_err(bind_err)?;

        let (delivery_tx, delivery_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(ListenerState {
            exchange_id,
            delivery: Mutex::new(Some(delivery_tx)),
            shutdown: Mutex::new(Some(shutdown_tx)),
            large_payload_warn_bytes: config.large_payload_warn_bytes,
        });

        let router = Router::new()
            .route("/:exchange/:channel", get(handle_callback))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .with_state(Arc::clone(&state));

        let server_state = Arc::clone(&state);
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!(exchange_id = %server_state.exchange_id, error = %e, "Callback listener failed");
                server_state.deliver(Err(TransportError::Serve(e.to_string())));
            }
        });

        debug!(exchange_id = %exchange_id, addr = %addr, "Callback listener bound");

        let endpoint = CallbackEndpoint { addr, exchange_id };
        let pending = PendingCallback {
            exchange_id,
            receiver: delivery_rx,
            settled: false,
            state,
            server: Some(server),
            shutdown_grace: config.shutdown_grace,
        };
        Ok((endpoint, pending))
    }
}

/// The not-yet-arrived callback of one exchange.
///
/// Owns the listening socket. Dropping it aborts the server.
pub struct PendingCallback {
    exchange_id: ExchangeId,
    receiver: oneshot::Receiver<Delivery>,
    settled: bool,
    state: Arc<ListenerState>,
    server: Option<JoinHandle<()>>,
    shutdown_grace: Duration,
}

impl PendingCallback {
    pub fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    /// Wait for the callback. Resolves at most once; later calls report the
    /// listener as closed.
    pub async fn recv(&mut self) -> Result<CallbackOutcome, TransportError> {
        if self.settled {
            return Err(TransportError::ListenerClosed);
        }
        let result = match (&mut self.receiver).await {
            Ok(delivery) => delivery,
            Err(_) => Err(TransportError::ListenerClosed),
        };
        self.settled = true;
        result
    }

    /// Stop accepting and wait for the socket to be released. Idempotent
    /// with the listener's own shutdown after a callback.
    pub async fn close(mut self) {
        self.state.trigger_shutdown();
        let Some(mut server) = self.server.take() else {
            return;
        };
        // Give the acknowledgement a moment to flush, then force it.
        if tokio::time::timeout(self.shutdown_grace, &mut server)
            .await
            .is_err()
        {
            server.abort();
            let _ = server.await;
        }
        debug!(exchange_id = %self.exchange_id, "Callback listener closed");
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            self.state.trigger_shutdown();
            server.abort();
        }
    }
}

async fn handle_callback(
    State(state): State<Arc<ListenerState>>,
    Path((exchange, channel)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> (StatusCode, &'static str) {
    if ExchangeId::parse(&exchange).ok() != Some(state.exchange_id) {
        warn!(
            exchange_id = %state.exchange_id,
            requested = %exchange,
            "Callback for a different exchange ignored"
        );
        return (StatusCode::NOT_FOUND, "unknown exchange");
    }

    let is_error_channel = match channel.as_str() {
        SUCCESS_PATH => false,
        ERROR_PATH => true,
        _ => return (StatusCode::NOT_FOUND, "unknown callback channel"),
    };

    let query = query.unwrap_or_default();
    if query.len() > state.large_payload_warn_bytes {
        warn!(
            exchange_id = %state.exchange_id,
            bytes = query.len(),
            threshold = state.large_payload_warn_bytes,
            "Unusually large callback payload"
        );
    }

    let payload = CallbackPayload::from_query(&query);
    let outcome = if is_error_channel || payload.is_error() {
        CallbackOutcome::Error(payload)
    } else {
        CallbackOutcome::Success(payload)
    };

    if !state.deliver(Ok(outcome)) {
        debug!(exchange_id = %state.exchange_id, "Duplicate callback ignored");
        return (StatusCode::GONE, "exchange already settled");
    }

    info!(
        exchange_id = %state.exchange_id,
        channel = %channel,
        "Callback received"
    );
    state.trigger_shutdown();
    (StatusCode::OK, "OK")
}
