//! Simulated Bear.
//!
//! [`FakeBear`] plays the part of the OS and of Bear: it receives the
//! outbound `bear://` URL, reads the `x-success` / `x-error` callbacks out
//! of it and calls one of them over real HTTP, the way Bear would.

use async_trait::async_trait;
use bear_xcallback::{BridgeConfig, ExternalInvoker, InvokeError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How the simulated Bear reacts to an invocation.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Call `x-success` with this query
    Succeed(String),
    /// Call `x-error` with this query
    Fail(String),
    /// Never call back
    Silent,
    /// The launcher itself fails
    LaunchFails,
    /// Hit a path of the listener that is not the callback, then succeed
    StrayThenSucceed(String),
    /// Call `x-success` twice with these queries
    SucceedTwice(String, String),
    /// Echo the `term` parameter back as the `notes` value
    EchoTerm,
}

/// Status codes the listener answered, in order.
pub type Responses = Arc<Mutex<Vec<u16>>>;

pub struct FakeBear {
    behaviour: Behaviour,
    delay: Duration,
    invocations: Mutex<Vec<Url>>,
    responses: Responses,
}

impl FakeBear {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Self::delayed(behaviour, Duration::ZERO)
    }

    /// Answer only after `delay`.
    pub fn delayed(behaviour: Behaviour, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            delay,
            invocations: Mutex::new(Vec::new()),
            responses: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn invocations(&self) -> Vec<Url> {
        self.invocations.lock().clone()
    }

    pub fn last_invocation(&self) -> Url {
        self.invocations
            .lock()
            .last()
            .cloned()
            .expect("no invocation recorded")
    }

    pub fn responses(&self) -> Vec<u16> {
        self.responses.lock().clone()
    }
}

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

async fn call(target: String, responses: Responses) {
    if let Ok(response) = reqwest::get(target).await {
        responses.lock().push(response.status().as_u16());
    }
}

#[async_trait]
impl ExternalInvoker for FakeBear {
    async fn invoke(&self, url: &Url) -> Result<(), InvokeError> {
        self.invocations.lock().push(url.clone());

        let success = query_param(url, "x-success").unwrap_or_default();
        let error = query_param(url, "x-error").unwrap_or_default();
        let responses = Arc::clone(&self.responses);
        let delay = self.delay;

        let calls: Vec<String> = match &self.behaviour {
            Behaviour::LaunchFails => {
                return Err(InvokeError::ExitStatus {
                    program: "open".into(),
                    status: "exit status: 1".into(),
                })
            }
            Behaviour::Silent => Vec::new(),
            Behaviour::Succeed(query) => vec![format!("{success}?{query}")],
            Behaviour::Fail(query) => vec![format!("{error}?{query}")],
            Behaviour::StrayThenSucceed(query) => {
                let stray = success.replace("/success", "/favicon.ico");
                vec![stray, format!("{success}?{query}")]
            }
            Behaviour::SucceedTwice(first, second) => {
                vec![format!("{success}?{first}"), format!("{success}?{second}")]
            }
            Behaviour::EchoTerm => {
                let term = query_param(url, "term").unwrap_or_default();
                let notes = format!(r#"[{{"identifier":"{term}","title":"{term}"}}]"#);
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("notes", &notes)
                    .finish();
                vec![format!("{success}?{query}")]
            }
        };

        // Bear answers after `open` has returned.
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for target in calls {
                call(target, Arc::clone(&responses)).await;
            }
        });
        Ok(())
    }
}

/// Default configuration with a short deadline and grace period.
pub fn test_config(timeout: Duration) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.timeouts.callback = timeout;
    config.callback.shutdown_grace = Duration::from_millis(200);
    config
}

/// Port from a callback URL such as `http://127.0.0.1:PORT/<id>/success`.
pub fn callback_port(invocation: &Url) -> u16 {
    query_param(invocation, "x-success")
        .and_then(|cb| Url::parse(&cb).ok())
        .and_then(|cb| cb.port())
        .expect("callback url without port")
}

/// Whether a fresh listener can take `port` on loopback.
pub fn port_is_free(port: u16) -> bool {
    std::net::TcpListener::bind(("127.0.0.1", port)).is_ok()
}
