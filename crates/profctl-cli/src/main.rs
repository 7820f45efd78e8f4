//! `profctl` — operator CLI for the profiling control plane.
//!
//! Talks to the core library in-process against a configured database; no
//! network hop to `profctl-daemon` is required. This is the typed Rust
//! analogue of the original system's ad-hoc developer scripts
//! (`run_heartbeat_agent.py`, `validate_api.py`): submitting a request,
//! sending a synthetic heartbeat for local testing, and querying host
//! status, all from one binary.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use profctl_schemas::{
    CommandStatus, CommandType, CompletionOutcome, HostLivenessStatus, ProfilingMode, RequestKind,
    StopLevel,
};

#[derive(Parser)]
#[command(name = "profctl")]
#[command(about = "Operator CLI for the profiling control plane", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database maintenance commands.
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Submit a profiling request (start or stop).
    Submit(SubmitArgs),

    /// Send a heartbeat on behalf of a host, for local testing.
    Heartbeat(HeartbeatArgs),

    /// Report the outcome of a dispatched command, for local testing.
    Complete(CompleteArgs),

    /// List per-(host, service) profiling status.
    Hosts(HostsArgs),
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(clap::Args)]
struct SubmitArgs {
    /// "start" or "stop".
    #[arg(long, value_enum)]
    kind: CliRequestKind,

    #[arg(long)]
    service: String,

    #[arg(long, default_value_t = 60)]
    duration_seconds: i64,

    #[arg(long, default_value_t = 11)]
    frequency_hz: i64,

    #[arg(long, value_enum, default_value_t = CliProfilingMode::Cpu)]
    mode: CliProfilingMode,

    #[arg(long, default_value_t = false)]
    continuous: bool,

    /// Repeatable. `host` targets the whole host; `host:pid,pid,...`
    /// restricts to a PID set on that host. Omit entirely to target every
    /// currently-active host for `--service` (start only; stop requires
    /// explicit targets).
    #[arg(long = "target")]
    targets: Vec<String>,

    /// Inline JSON object merged into the command's free-form extras.
    #[arg(long)]
    additional_args: Option<String>,

    /// Only meaningful when `--kind stop`.
    #[arg(long, value_enum)]
    stop_level: Option<CliStopLevel>,
}

#[derive(clap::Args)]
struct HeartbeatArgs {
    #[arg(long)]
    host: String,

    #[arg(long)]
    ip: String,

    #[arg(long)]
    service: String,

    #[arg(long, value_enum, default_value_t = CliHostLivenessStatus::Active)]
    status: CliHostLivenessStatus,

    #[arg(long)]
    last_command_id: Option<uuid::Uuid>,

    /// Repeatable; the host's currently-known PID inventory (orthogonal to
    /// command reconciliation — see spec's Open Question on `available_pids`).
    #[arg(long = "available-pid")]
    available_pids: Vec<i64>,
}

#[derive(clap::Args)]
struct CompleteArgs {
    #[arg(long)]
    command_id: uuid::Uuid,

    #[arg(long)]
    host: String,

    #[arg(long, value_enum)]
    status: CliCompletionOutcome,

    #[arg(long)]
    execution_time: Option<f64>,

    #[arg(long)]
    error: Option<String>,

    #[arg(long)]
    results_path: Option<String>,
}

#[derive(clap::Args, Default)]
struct HostsArgs {
    #[arg(long)]
    service: Option<String>,

    #[arg(long)]
    hostname_substring: Option<String>,

    #[arg(long)]
    ip_prefix: Option<String>,

    #[arg(long = "status", value_enum)]
    statuses: Vec<CliCommandStatus>,

    #[arg(long = "command-type", value_enum)]
    command_types: Vec<CliCommandType>,

    #[arg(long)]
    pid: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = profctl_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => commands::db::status(&pool).await?,
                DbCmd::Migrate => commands::db::migrate(&pool).await?,
            }
        }
        Commands::Submit(args) => {
            let config = profctl_config::CoreConfig::from_env()?;
            let pool = profctl_db::connect_from_env().await?;
            commands::submit::run(&pool, &config, args.into()).await?;
        }
        Commands::Heartbeat(args) => {
            let pool = profctl_db::connect_from_env().await?;
            commands::heartbeat::run(&pool, args.into()).await?;
        }
        Commands::Complete(args) => {
            let pool = profctl_db::connect_from_env().await?;
            commands::complete::run(&pool, args.into()).await?;
        }
        Commands::Hosts(args) => {
            let pool = profctl_db::connect_from_env().await?;
            commands::hosts::run(&pool, args.into()).await?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// clap value-enum shims — thin copies of the profctl-schemas enums so this
// crate doesn't need to implement `clap::ValueEnum` for shared wire types.
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliRequestKind {
    Start,
    Stop,
}

impl From<CliRequestKind> for RequestKind {
    fn from(k: CliRequestKind) -> Self {
        match k {
            CliRequestKind::Start => RequestKind::Start,
            CliRequestKind::Stop => RequestKind::Stop,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliProfilingMode {
    Cpu,
    Allocation,
    None,
}

impl From<CliProfilingMode> for ProfilingMode {
    fn from(m: CliProfilingMode) -> Self {
        match m {
            CliProfilingMode::Cpu => ProfilingMode::Cpu,
            CliProfilingMode::Allocation => ProfilingMode::Allocation,
            CliProfilingMode::None => ProfilingMode::None,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliStopLevel {
    Process,
    Host,
}

impl From<CliStopLevel> for StopLevel {
    fn from(s: CliStopLevel) -> Self {
        match s {
            CliStopLevel::Process => StopLevel::Process,
            CliStopLevel::Host => StopLevel::Host,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliHostLivenessStatus {
    Active,
    Idle,
    Error,
}

impl From<CliHostLivenessStatus> for HostLivenessStatus {
    fn from(s: CliHostLivenessStatus) -> Self {
        match s {
            CliHostLivenessStatus::Active => HostLivenessStatus::Active,
            CliHostLivenessStatus::Idle => HostLivenessStatus::Idle,
            CliHostLivenessStatus::Error => HostLivenessStatus::Error,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliCompletionOutcome {
    Completed,
    Failed,
}

impl From<CliCompletionOutcome> for CompletionOutcome {
    fn from(s: CliCompletionOutcome) -> Self {
        match s {
            CliCompletionOutcome::Completed => CompletionOutcome::Completed,
            CliCompletionOutcome::Failed => CompletionOutcome::Failed,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliCommandStatus {
    Pending,
    Sent,
    Completed,
    Failed,
}

impl From<CliCommandStatus> for CommandStatus {
    fn from(s: CliCommandStatus) -> Self {
        match s {
            CliCommandStatus::Pending => CommandStatus::Pending,
            CliCommandStatus::Sent => CommandStatus::Sent,
            CliCommandStatus::Completed => CommandStatus::Completed,
            CliCommandStatus::Failed => CommandStatus::Failed,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliCommandType {
    Start,
    Stop,
}

impl From<CliCommandType> for CommandType {
    fn from(s: CliCommandType) -> Self {
        match s {
            CliCommandType::Start => CommandType::Start,
            CliCommandType::Stop => CommandType::Stop,
        }
    }
}

// ---------------------------------------------------------------------------
// Args -> command-module input conversions
// ---------------------------------------------------------------------------

impl From<SubmitArgs> for commands::submit::SubmitInput {
    fn from(args: SubmitArgs) -> Self {
        commands::submit::SubmitInput {
            kind: args.kind.into(),
            service: args.service,
            duration_seconds: args.duration_seconds,
            frequency_hz: args.frequency_hz,
            mode: args.mode.into(),
            continuous: args.continuous,
            raw_targets: args.targets,
            raw_additional_args: args.additional_args,
            stop_level: args.stop_level.map(Into::into),
        }
    }
}

impl From<HeartbeatArgs> for commands::heartbeat::HeartbeatInput {
    fn from(args: HeartbeatArgs) -> Self {
        commands::heartbeat::HeartbeatInput {
            host: args.host,
            ip: args.ip,
            service: args.service,
            status: args.status.into(),
            last_command_id: args.last_command_id,
            available_pids: args.available_pids,
        }
    }
}

impl From<CompleteArgs> for commands::complete::CompleteInput {
    fn from(args: CompleteArgs) -> Self {
        commands::complete::CompleteInput {
            command_id: args.command_id,
            host: args.host,
            status: args.status.into(),
            execution_time: args.execution_time,
            error: args.error,
            results_path: args.results_path,
        }
    }
}

impl From<HostsArgs> for commands::hosts::HostsInput {
    fn from(args: HostsArgs) -> Self {
        commands::hosts::HostsInput {
            service: args.service,
            hostname_substring: args.hostname_substring,
            ip_prefix: args.ip_prefix,
            statuses: args.statuses.into_iter().map(Into::into).collect(),
            command_types: args.command_types.into_iter().map(Into::into).collect(),
            pid: args.pid,
        }
    }
}
