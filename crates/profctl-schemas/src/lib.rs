//! Shared domain and wire types for the profiling control plane.
//!
//! Every crate in this workspace (`profctl-db`, `profctl-reconcile`,
//! `profctl-core`, `profctl-daemon`, `profctl-cli`) depends on these types
//! instead of hand-rolling its own structs, so a `ProfilingRequest` means
//! the same thing everywhere.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilingMode {
    Cpu,
    Allocation,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopLevel {
    Process,
    Host,
}

/// Derived request status. Never written authoritatively by a handler that
/// lacks the full command/execution picture — see `recompute_request_status`
/// in `profctl-db` and `derive_request_status` in `profctl-reconcile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Completed,
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Sent,
    Completed,
    Failed,
}

impl CommandStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }

    pub fn is_live(self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Assigned,
    Completed,
    Failed,
}

/// Outcome reported by an agent through `ReportCommandCompletion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Completed,
    Failed,
}

impl From<CompletionOutcome> for ExecutionStatus {
    fn from(o: CompletionOutcome) -> Self {
        match o {
            CompletionOutcome::Completed => ExecutionStatus::Completed,
            CompletionOutcome::Failed => ExecutionStatus::Failed,
        }
    }
}

impl From<CompletionOutcome> for CommandStatus {
    fn from(o: CompletionOutcome) -> Self {
        match o {
            CompletionOutcome::Completed => CommandStatus::Completed,
            CompletionOutcome::Failed => CommandStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostLivenessStatus {
    Active,
    Idle,
    Error,
}

// ---------------------------------------------------------------------------
// ProfilingConfig — the folded, per-(host,service) configuration.
// ---------------------------------------------------------------------------

/// Folded start/stop configuration for one (host, service) command.
///
/// `extras` is the open, forward-compatible bag for free-form
/// `additional_args` keys that don't (yet) warrant a typed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingConfig {
    pub duration_seconds: i64,
    pub frequency_hz: i64,
    pub mode: ProfilingMode,
    pub continuous: bool,
    pub pids: Vec<i64>,
    pub stop_level: Option<StopLevel>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl ProfilingConfig {
    /// Sort and dedupe `pids` in place. Called after every union/removal so
    /// the invariant "pids is sorted, deduplicated" always holds on a
    /// persisted row.
    pub fn normalize_pids(&mut self) {
        self.pids.sort_unstable();
        self.pids.dedup();
    }
}

// ---------------------------------------------------------------------------
// ProfilingRequest
// ---------------------------------------------------------------------------

/// Operator intent, as submitted. `targets` maps hostname to an optional
/// per-host PID set: a present key restricts the request to that host; an
/// absent/empty PID set for a present key means "the host as a whole".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfilingRequest {
    pub kind: RequestKind,
    pub service: String,
    pub duration_seconds: i64,
    pub frequency_hz: i64,
    pub mode: ProfilingMode,
    pub continuous: bool,
    #[serde(default)]
    pub additional_args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub targets: BTreeMap<String, Option<Vec<i64>>>,
    pub stop_level: Option<StopLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingRequest {
    pub id: Uuid,
    pub kind: RequestKind,
    pub service: String,
    pub duration_seconds: i64,
    pub frequency_hz: i64,
    pub mode: ProfilingMode,
    pub continuous: bool,
    pub additional_args: serde_json::Map<String, serde_json::Value>,
    pub targets: BTreeMap<String, Option<Vec<i64>>>,
    pub stop_level: Option<StopLevel>,
    /// Materialized cache of the derived status. Never authoritative — see
    /// `RequestStatus` doc comment.
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// ProfilingCommand / ProfilingExecution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingCommand {
    pub command_id: Uuid,
    pub host: String,
    pub service: String,
    pub command_type: CommandType,
    pub combined_config: ProfilingConfig,
    pub request_ids: Vec<Uuid>,
    pub status: CommandStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub execution_time: Option<f64>,
    pub error_message: Option<String>,
    pub results_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingExecution {
    pub command_id: Uuid,
    pub host: String,
    pub service: String,
    pub profiling_request_id: Option<Uuid>,
    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub execution_time: Option<f64>,
    pub results_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostHeartbeat {
    pub host: String,
    pub service: String,
    pub ip: String,
    pub status: HostLivenessStatus,
    pub last_command_id: Option<Uuid>,
    pub heartbeat_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The host's last-reported PID set. Last-writer-wins, orthogonal to
    /// command reconciliation: an inventory signal only, never consumed
    /// when folding or dispatching commands.
    pub available_pids: Option<Vec<i64>>,
}

// ---------------------------------------------------------------------------
// External API shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitProfilingRequestResponse {
    pub request_id: Uuid,
    pub command_ids: Vec<Uuid>,
    pub estimated_completion_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBulkRequest {
    pub requests: Vec<NewProfilingRequest>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub index: usize,
    pub request_id: Option<Uuid>,
    pub command_ids: Vec<Uuid>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBulkResponse {
    pub results: Vec<BulkItemResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub host: String,
    pub ip: String,
    pub service: String,
    pub status: HostLivenessStatus,
    pub last_command_id: Option<Uuid>,
    pub ts: Option<DateTime<Utc>>,
    pub available_pids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingCommandPayload {
    pub command_type: CommandType,
    pub combined_config: ProfilingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub success: bool,
    pub message: String,
    pub command_id: Option<Uuid>,
    pub profiling_command: Option<ProfilingCommandPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCompletionRequest {
    pub command_id: Uuid,
    pub host: String,
    pub status: CompletionOutcome,
    pub execution_time: Option<f64>,
    pub error: Option<String>,
    pub results_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCompletionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostStatusFilters {
    pub service: Option<String>,
    pub hostname_substring: Option<String>,
    pub ip_prefix: Option<String>,
    #[serde(default)]
    pub statuses: Vec<CommandStatus>,
    #[serde(default)]
    pub command_types: Vec<CommandType>,
    pub pid: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostProfilingStatusRow {
    pub service: String,
    pub host: String,
    pub ip: String,
    pub pids: Vec<i64>,
    pub command_type: Option<CommandType>,
    pub status: Option<CommandStatus>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}
