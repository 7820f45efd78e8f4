//! profctl-reconcile
//!
//! Deterministic, pure logic for the Request-to-Command Reconciliation
//! Core: config merging, PID-set arithmetic, derived request status, and
//! capacity-gate arithmetic. No IO, no database, no async — every function
//! here is a value transformer that `profctl-core` calls between
//! persistence reads and writes.

mod capacity;
mod merge;
mod pid;
mod status;

pub use capacity::{bulk_within_capacity, CapacityCheck};
pub use merge::merge;
pub use pid::{plan_stop_for_host, StopPlan};
pub use status::derive_request_status;
