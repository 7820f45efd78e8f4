//! `TEXT`-column round-tripping for the domain enums defined in
//! `profctl-schemas`. Mirrors the `as_str`/`parse` pattern used for
//! lifecycle-status columns elsewhere, factored into a trait here because
//! the enums themselves live in a separate crate.

use anyhow::{anyhow, Result};
use profctl_schemas::{
    CommandStatus, CommandType, ExecutionStatus, HostLivenessStatus, ProfilingMode, RequestKind,
    RequestStatus, StopLevel,
};

pub trait SqlEnum: Sized {
    fn as_sql(&self) -> &'static str;
    fn from_sql(s: &str) -> Result<Self>;
}

impl SqlEnum for RequestKind {
    fn as_sql(&self) -> &'static str {
        match self {
            RequestKind::Start => "start",
            RequestKind::Stop => "stop",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(RequestKind::Start),
            "stop" => Ok(RequestKind::Stop),
            other => Err(anyhow!("invalid request kind: {other}")),
        }
    }
}

impl SqlEnum for ProfilingMode {
    fn as_sql(&self) -> &'static str {
        match self {
            ProfilingMode::Cpu => "cpu",
            ProfilingMode::Allocation => "allocation",
            ProfilingMode::None => "none",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(ProfilingMode::Cpu),
            "allocation" => Ok(ProfilingMode::Allocation),
            "none" => Ok(ProfilingMode::None),
            other => Err(anyhow!("invalid profiling mode: {other}")),
        }
    }
}

impl SqlEnum for StopLevel {
    fn as_sql(&self) -> &'static str {
        match self {
            StopLevel::Process => "process",
            StopLevel::Host => "host",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "process" => Ok(StopLevel::Process),
            "host" => Ok(StopLevel::Host),
            other => Err(anyhow!("invalid stop level: {other}")),
        }
    }
}

impl SqlEnum for RequestStatus {
    fn as_sql(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Sent => "sent",
            RequestStatus::Completed => "completed",
            RequestStatus::Failed => "failed",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "sent" => Ok(RequestStatus::Sent),
            "completed" => Ok(RequestStatus::Completed),
            "failed" => Ok(RequestStatus::Failed),
            other => Err(anyhow!("invalid request status: {other}")),
        }
    }
}

impl SqlEnum for CommandType {
    fn as_sql(&self) -> &'static str {
        match self {
            CommandType::Start => "start",
            CommandType::Stop => "stop",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(CommandType::Start),
            "stop" => Ok(CommandType::Stop),
            other => Err(anyhow!("invalid command type: {other}")),
        }
    }
}

impl SqlEnum for CommandStatus {
    fn as_sql(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Sent => "sent",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(CommandStatus::Pending),
            "sent" => Ok(CommandStatus::Sent),
            "completed" => Ok(CommandStatus::Completed),
            "failed" => Ok(CommandStatus::Failed),
            other => Err(anyhow!("invalid command status: {other}")),
        }
    }
}

impl SqlEnum for ExecutionStatus {
    fn as_sql(&self) -> &'static str {
        match self {
            ExecutionStatus::Assigned => "assigned",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "assigned" => Ok(ExecutionStatus::Assigned),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(anyhow!("invalid execution status: {other}")),
        }
    }
}

impl SqlEnum for HostLivenessStatus {
    fn as_sql(&self) -> &'static str {
        match self {
            HostLivenessStatus::Active => "active",
            HostLivenessStatus::Idle => "idle",
            HostLivenessStatus::Error => "error",
        }
    }

    fn from_sql(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(HostLivenessStatus::Active),
            "idle" => Ok(HostLivenessStatus::Idle),
            "error" => Ok(HostLivenessStatus::Error),
            other => Err(anyhow!("invalid host liveness status: {other}")),
        }
    }
}
