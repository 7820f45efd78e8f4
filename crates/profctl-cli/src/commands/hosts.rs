//! `profctl hosts` — `ListHostProfilingStatus`, printed as a small table.

use anyhow::Result;
use profctl_schemas::{CommandStatus, CommandType, HostStatusFilters};
use sqlx::PgPool;

#[derive(Default)]
pub struct HostsInput {
    pub service: Option<String>,
    pub hostname_substring: Option<String>,
    pub ip_prefix: Option<String>,
    pub statuses: Vec<CommandStatus>,
    pub command_types: Vec<CommandType>,
    pub pid: Option<i64>,
}

pub async fn run(pool: &PgPool, input: HostsInput) -> Result<()> {
    let filters = HostStatusFilters {
        service: input.service,
        hostname_substring: input.hostname_substring,
        ip_prefix: input.ip_prefix,
        statuses: input.statuses,
        command_types: input.command_types,
        pid: input.pid,
    };

    let rows = profctl_core::list_host_profiling_status(pool, &filters).await?;

    if rows.is_empty() {
        println!("(no matching hosts)");
        return Ok(());
    }

    for row in rows {
        println!(
            "service={} host={} ip={} command_type={:?} status={:?} pids={:?} last_heartbeat={}",
            row.service,
            row.host,
            row.ip,
            row.command_type,
            row.status,
            row.pids,
            row.last_heartbeat.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
        );
    }

    Ok(())
}
