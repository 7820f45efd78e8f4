//! Heartbeat handling: liveness upsert, pending→sent transition,
//! best-effort execution-row write, command payload echo.

use chrono::Utc;
use profctl_schemas::{ExecutionStatus, HeartbeatRequest, HeartbeatResponse, ProfilingCommandPayload};
use sqlx::PgPool;
use tracing::warn;

use crate::error::{CoreError, CoreResult};

pub async fn heartbeat(pool: &PgPool, req: &HeartbeatRequest) -> CoreResult<HeartbeatResponse> {
    let ts = req.ts.unwrap_or_else(Utc::now);

    profctl_db::update_heartbeat(
        pool,
        &req.host,
        &req.service,
        &req.ip,
        req.status,
        req.last_command_id,
        ts,
        req.available_pids.as_deref(),
    )
    .await
    .map_err(CoreError::Fatal)?;

    let command = profctl_db::get_latest_command_for_host(pool, &req.host, &req.service)
        .await
        .map_err(CoreError::Fatal)?;

    let Some(command) = command else {
        return Ok(HeartbeatResponse {
            success: true,
            message: "no command pending for this host".to_string(),
            command_id: None,
            profiling_command: None,
        });
    };

    if !command.status.is_live() {
        return Ok(HeartbeatResponse {
            success: true,
            message: "no command pending for this host".to_string(),
            command_id: None,
            profiling_command: None,
        });
    }

    // Idempotent: a second heartbeat against an already-`sent` command is a
    // no-op here, but the payload below is still echoed either way.
    let transitioned = profctl_db::mark_command_sent(pool, command.command_id, &req.host)
        .await
        .map_err(CoreError::Fatal)?;

    if transitioned {
        for request_id in &command.request_ids {
            let result = profctl_db::record_execution(
                pool,
                command.command_id,
                &req.host,
                &req.service,
                Some(*request_id),
                ExecutionStatus::Assigned,
                Some(Utc::now()),
                None,
                None,
                None,
                None,
            )
            .await;

            if let Err(err) = result {
                warn!(
                    command_id = %command.command_id, host = %req.host, request_id = %request_id,
                    error = %err,
                    "execution audit write failed during dispatch; command still delivered"
                );
            }
        }
    }

    Ok(HeartbeatResponse {
        success: true,
        message: "command delivered".to_string(),
        command_id: Some(command.command_id),
        profiling_command: Some(ProfilingCommandPayload {
            command_type: command.command_type,
            combined_config: command.combined_config,
        }),
    })
}
