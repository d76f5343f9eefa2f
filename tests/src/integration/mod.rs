//! End-to-end flows against a simulated Bear.

pub mod fixtures;

mod exchange_flows;
mod facade_flows;
