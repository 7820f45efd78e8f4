//! `profctl-daemon` library target.
//!
//! Exposes the router and state for integration tests; `main.rs` depends on
//! this library target for the binary entry point.

pub mod routes;
pub mod state;
