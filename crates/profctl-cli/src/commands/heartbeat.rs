//! `profctl heartbeat` — sends a synthetic heartbeat on behalf of a host.
//! Useful for exercising command delivery locally without running the
//! actual agent.

use anyhow::Result;
use profctl_schemas::{HeartbeatRequest, HostLivenessStatus};
use sqlx::PgPool;
use uuid::Uuid;

pub struct HeartbeatInput {
    pub host: String,
    pub ip: String,
    pub service: String,
    pub status: HostLivenessStatus,
    pub last_command_id: Option<Uuid>,
    pub available_pids: Vec<i64>,
}

pub async fn run(pool: &PgPool, input: HeartbeatInput) -> Result<()> {
    let req = HeartbeatRequest {
        host: input.host,
        ip: input.ip,
        service: input.service,
        status: input.status,
        last_command_id: input.last_command_id,
        ts: None,
        available_pids: if input.available_pids.is_empty() {
            None
        } else {
            Some(input.available_pids)
        },
    };

    let resp = profctl_core::heartbeat(pool, &req).await?;

    println!("success={} message={}", resp.success, resp.message);
    if let Some(command_id) = resp.command_id {
        println!("command_id={command_id}");
    }
    if let Some(command) = resp.profiling_command {
        println!("command_type={:?}", command.command_type);
        println!("combined_config={}", serde_json::to_string(&command.combined_config)?);
    }

    Ok(())
}
