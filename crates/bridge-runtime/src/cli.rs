//! Command-line parsing.

use bear_xcallback::find_operation;
use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

/// Bear Bridge: typed access to Bear's x-callback-url commands
#[derive(Parser, Debug)]
#[command(name = "bear-bridge", version)]
#[command(about = "Run one Bear command and print the correlated result as JSON")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// What the binary was asked to do.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the available operations and their parameters
    List,

    /// Run one operation
    Run {
        /// Operation name, as printed by `bear-bridge list`
        #[arg(value_parser = parse_operation)]
        operation: String,

        /// JSON object with the operation's parameters, or '-' to read it
        /// from stdin. Omitted means no parameters.
        #[arg(value_parser = parse_params_arg)]
        params: Option<ParamsSource>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamsSource {
    Inline(Value),
    Stdin,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown operation '{0}' (see `bear-bridge list`)")]
    UnknownOperation(String),

    #[error("parameters are not valid JSON: {0}")]
    InvalidParams(#[from] serde_json::Error),
}

fn parse_operation(name: &str) -> Result<String, CliError> {
    match find_operation(name) {
        Some(_) => Ok(name.to_string()),
        None => Err(CliError::UnknownOperation(name.to_string())),
    }
}

fn parse_params_arg(raw: &str) -> Result<ParamsSource, CliError> {
    match raw {
        "-" => Ok(ParamsSource::Stdin),
        raw => Ok(ParamsSource::Inline(parse_params(raw)?)),
    }
}

/// Parse a parameter document; blank input means no parameters.
pub fn parse_params(raw: &str) -> Result<Value, CliError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(raw)?)
}
