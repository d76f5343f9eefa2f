//! # Bridge Runtime Library
//!
//! Argument parsing and result rendering for the `bear-bridge` binary,
//! exposed as a library for testing. The entry point is `main.rs`.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments with clap (`list` and `--help` need nothing else)
//! 2. Initialise logging on stderr
//! 3. Load configuration (defaults, optional file, environment)
//! 4. Build the Bear client around the `open` invoker
//! 5. Run the operation, cancelled by Ctrl+C
//! 6. Print the result JSON; exit 1 on a bridge error

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod output;

pub use cli::{parse_params, Cli, CliError, Command, ParamsSource};
pub use output::{operations_listing, render, Rendered};
