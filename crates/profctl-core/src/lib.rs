//! Request-to-Command Reconciliation Core.
//!
//! Orchestrates `profctl-db` (persistence) and `profctl-reconcile` (pure
//! merge/capacity/status arithmetic) into the five operations the daemon
//! and CLI call: submitting requests (single and bulk), accepting
//! heartbeats, recording completions, and querying host status.

mod completion;
mod error;
mod heartbeat;
mod list_status;
mod reconcile;
mod submit;

pub use error::{CoreError, CoreResult};

pub use completion::report_command_completion;
pub use heartbeat::heartbeat;
pub use list_status::list_host_profiling_status;
pub use submit::{submit_bulk_profiling_requests, submit_profiling_request};

// Re-exported so callers constructing test fixtures don't need a direct
// dependency on profctl-reconcile just for this one helper.
pub use reconcile::estimated_completion_time;
