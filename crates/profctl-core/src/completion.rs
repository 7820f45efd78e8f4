//! Completion reporting: validate an inbound completion report against
//! its execution row, write the audit trail, and — only when it still
//! corresponds to the live command — recompute the contributing requests'
//! derived status.

use chrono::Utc;
use profctl_schemas::{CommandStatus, ExecutionStatus, ReportCompletionRequest, ReportCompletionResponse};
use sqlx::PgPool;

use crate::error::{CoreError, CoreResult};

pub async fn report_command_completion(
    pool: &PgPool,
    req: &ReportCompletionRequest,
) -> CoreResult<ReportCompletionResponse> {
    let execution = profctl_db::get_execution(pool, req.command_id, &req.host)
        .await
        .map_err(CoreError::Fatal)?;

    let execution = match execution {
        Some(e) => e,
        None => {
            return Err(CoreError::validation(format!(
                "command {} not found for host {}",
                req.command_id, req.host
            )))
        }
    };

    if execution.status != ExecutionStatus::Assigned {
        return Err(CoreError::validation(format!(
            "command {} for host {} is not in assigned state (currently {:?})",
            req.command_id, req.host, execution.status
        )));
    }

    let now = Utc::now();

    profctl_db::record_execution(
        pool,
        req.command_id,
        &req.host,
        &execution.service,
        execution.profiling_request_id,
        req.status.into(),
        execution.started_at,
        Some(now),
        req.error.as_deref(),
        req.execution_time,
        req.results_path.as_deref(),
    )
    .await
    .map_err(CoreError::Fatal)?;

    let current = profctl_db::get_latest_command_for_host(pool, &req.host, &execution.service)
        .await
        .map_err(CoreError::Fatal)?;

    let is_current = current
        .as_ref()
        .map(|c| c.command_id == req.command_id)
        .unwrap_or(false);

    if !is_current {
        return Ok(ReportCompletionResponse {
            success: true,
            message: "execution recorded; command was superseded, no command update written".to_string(),
        });
    }

    let command = current.expect("is_current implies Some");
    let command_status: CommandStatus = req.status.into();

    profctl_db::mark_command_terminal(
        pool,
        req.command_id,
        command_status,
        now,
        req.execution_time,
        req.error.as_deref(),
        req.results_path.as_deref(),
    )
    .await
    .map_err(CoreError::Fatal)?;

    profctl_db::recompute_request_status(pool, &command.request_ids)
        .await
        .map_err(CoreError::Fatal)?;

    Ok(ReportCompletionResponse {
        success: true,
        message: "completion recorded".to_string(),
    })
}
