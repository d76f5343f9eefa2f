//! `bear-bridge` - run one Bear command and print the correlated result.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use bear_xcallback::{BearClient, BridgeConfig, OpenUrlInvoker};
use bridge_runtime::{operations_listing, parse_params, render, Cli, Command, ParamsSource};
use bridge_telemetry::{init_telemetry, TelemetryConfig};

/// Completes on Ctrl+C; never completes if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("Interrupted, cancelling");
}

async fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("failed to read parameters from stdin")?;
    Ok(raw)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let (operation, params) = match cli.command {
        Command::List => {
            print_json(&operations_listing())?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Run { operation, params } => (operation, params),
    };

    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialise logging")?;

    let config = BridgeConfig::from_env().context("failed to load configuration")?;
    let invoker = Arc::new(OpenUrlInvoker::from_config(&config.invoker));
    let client = BearClient::new(config, invoker).context("invalid configuration")?;

    let params = match params {
        None => serde_json::Value::Null,
        Some(ParamsSource::Inline(value)) => value,
        Some(ParamsSource::Stdin) => parse_params(&read_stdin().await?)?,
    };

    let result = client
        .dispatch_with_cancel(&operation, params, interrupted())
        .await;
    let rendered = render(&result);
    print_json(&rendered.body)?;

    Ok(if rendered.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("bear-bridge: {e:#}");
            ExitCode::from(2)
        }
    }
}
