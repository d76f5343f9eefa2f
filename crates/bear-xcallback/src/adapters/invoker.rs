//! Process-based URL invoker.
//!
//! Runs `open -g <url>` (macOS) or any configured equivalent and waits for
//! the launcher to exit. The launcher returns as soon as the URL has been
//! handed to the OS, long before Bear has done anything with it.

use crate::domain::config::InvokerConfig;
use crate::domain::error::InvokeError;
use crate::ports::outbound::ExternalInvoker;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use url::Url;

/// Invoker that launches an external program with the URL as last argument.
#[derive(Debug, Clone)]
pub struct OpenUrlInvoker {
    program: String,
    args: Vec<String>,
}

impl OpenUrlInvoker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &InvokerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for OpenUrlInvoker {
    fn default() -> Self {
        Self::from_config(&InvokerConfig::default())
    }
}

#[async_trait]
impl ExternalInvoker for OpenUrlInvoker {
    async fn invoke(&self, url: &Url) -> Result<(), InvokeError> {
        debug!(program = %self.program, scheme = url.scheme(), path = url.path(), "Dispatching URL");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| InvokeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let status = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{} ({})", output.status, stderr)
        };
        Err(InvokeError::ExitStatus {
            program: self.program.clone(),
            status,
        })
    }
}
