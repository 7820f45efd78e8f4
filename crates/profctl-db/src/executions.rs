use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use profctl_schemas::{ExecutionStatus, ProfilingExecution};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::retry::{with_retry, RetryPolicy};
use crate::sql_enum::SqlEnum;

fn row_to_execution(row: &sqlx::postgres::PgRow) -> Result<ProfilingExecution> {
    let status_str: String = row.try_get("status")?;
    Ok(ProfilingExecution {
        command_id: row.try_get("command_id")?,
        host: row.try_get("host")?,
        service: row.try_get("service")?,
        profiling_request_id: row.try_get("profiling_request_id")?,
        status: ExecutionStatus::from_sql(&status_str)?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        error_message: row.try_get("error_message")?,
        execution_time: row.try_get("execution_time")?,
        results_path: row.try_get("results_path")?,
    })
}

/// Upsert on the (command_id, host) primary key, so re-dispatch of the
/// same command never duplicates the audit row and a duplicate completion
/// report is idempotent at the audit level.
#[allow(clippy::too_many_arguments)]
pub async fn record_execution(
    pool: &PgPool,
    command_id: Uuid,
    host: &str,
    service: &str,
    profiling_request_id: Option<Uuid>,
    status: ExecutionStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<&str>,
    execution_time: Option<f64>,
    results_path: Option<&str>,
) -> Result<()> {
    with_retry(RetryPolicy::default(), || async {
        sqlx::query(
            r#"
            insert into profiling_executions
                (command_id, host, service, profiling_request_id, status, started_at, completed_at,
                 error_message, execution_time, results_path)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            on conflict (command_id, host) do update set
                profiling_request_id = coalesce(excluded.profiling_request_id, profiling_executions.profiling_request_id),
                status = excluded.status,
                started_at = coalesce(profiling_executions.started_at, excluded.started_at),
                completed_at = excluded.completed_at,
                error_message = excluded.error_message,
                execution_time = excluded.execution_time,
                results_path = excluded.results_path
            "#,
        )
        .bind(command_id)
        .bind(host)
        .bind(service)
        .bind(profiling_request_id)
        .bind(status.as_sql())
        .bind(started_at)
        .bind(completed_at)
        .bind(error_message)
        .bind(execution_time)
        .bind(results_path)
        .execute(pool)
        .await
        .context("record_execution failed")?;

        Ok(())
    })
    .await
}

pub async fn get_execution(
    pool: &PgPool,
    command_id: Uuid,
    host: &str,
) -> Result<Option<ProfilingExecution>> {
    let row = sqlx::query(
        r#"
        select command_id, host, service, profiling_request_id, status, started_at, completed_at,
               error_message, execution_time, results_path
        from profiling_executions
        where command_id = $1 and host = $2
        "#,
    )
    .bind(command_id)
    .bind(host)
    .fetch_optional(pool)
    .await
    .context("get_execution failed")?;

    row.as_ref().map(row_to_execution).transpose()
}
