//! # Bear Bridge Test Suite
//!
//! Unified test crate for flows that span the whole bridge.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # FakeBear: an invoker that answers over HTTP
//!     ├── exchange_flows.rs  # Correlator: resolve, timeout, error, cancel
//!     └── facade_flows.rs    # BearClient: typed operations and dispatch
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bb-tests
//! cargo test -p bb-tests integration::exchange_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
