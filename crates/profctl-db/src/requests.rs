use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use profctl_schemas::{NewProfilingRequest, ProfilingRequest, RequestStatus};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::retry::{with_retry, RetryPolicy};
use crate::sql_enum::SqlEnum;

fn row_to_request(row: &sqlx::postgres::PgRow) -> Result<ProfilingRequest> {
    let kind_str: String = row.try_get("kind")?;
    let mode_str: String = row.try_get("mode")?;
    let status_str: String = row.try_get("status")?;
    let stop_level_str: Option<String> = row.try_get("stop_level")?;
    let targets_json: serde_json::Value = row.try_get("targets")?;
    let additional_args: serde_json::Value = row.try_get("additional_args")?;

    Ok(ProfilingRequest {
        id: row.try_get("id")?,
        kind: profctl_schemas::RequestKind::from_sql(&kind_str)?,
        service: row.try_get("service")?,
        duration_seconds: row.try_get("duration_seconds")?,
        frequency_hz: row.try_get("frequency_hz")?,
        mode: profctl_schemas::ProfilingMode::from_sql(&mode_str)?,
        continuous: row.try_get("continuous")?,
        additional_args: match additional_args {
            serde_json::Value::Object(m) => m,
            _ => Default::default(),
        },
        targets: serde_json::from_value(targets_json).context("decode targets jsonb")?,
        stop_level: stop_level_str
            .map(|s| profctl_schemas::StopLevel::from_sql(&s))
            .transpose()?,
        status: RequestStatus::from_sql(&status_str)?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Persist a new profiling request with status `pending`. Always succeeds
/// for a well-formed request.
pub async fn insert_request(pool: &PgPool, req: &NewProfilingRequest) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let targets_json = serde_json::to_value(&req.targets).context("encode targets")?;

    with_retry(RetryPolicy::default(), || async {
        sqlx::query(
            r#"
            insert into profiling_requests
                (id, kind, service, duration_seconds, frequency_hz, mode, continuous,
                 additional_args, targets, stop_level, status, created_at)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', now())
            "#,
        )
        .bind(id)
        .bind(req.kind.as_sql())
        .bind(&req.service)
        .bind(req.duration_seconds)
        .bind(req.frequency_hz)
        .bind(req.mode.as_sql())
        .bind(req.continuous)
        .bind(serde_json::Value::Object(req.additional_args.clone()))
        .bind(&targets_json)
        .bind(req.stop_level.map(|s| s.as_sql()))
        .execute(pool)
        .await
        .context("insert_request failed")?;
        Ok(())
    })
    .await?;

    Ok(id)
}

pub async fn get_request(pool: &PgPool, id: Uuid) -> Result<Option<ProfilingRequest>> {
    let row = sqlx::query(
        r#"
        select id, kind, service, duration_seconds, frequency_hz, mode, continuous,
               additional_args, targets, stop_level, status, created_at, completed_at
        from profiling_requests
        where id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("get_request failed")?;

    row.as_ref().map(row_to_request).transpose()
}

/// Read the out-of-band host -> PID mapping stored on the request row
/// (`targets`), rather than an in-process cache keyed by request id.
pub async fn get_host_pid_mapping(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<BTreeMap<String, Option<Vec<i64>>>> {
    let req = get_request(pool, request_id)
        .await?
        .context("get_host_pid_mapping: request not found")?;
    Ok(req.targets)
}

/// Recompute and persist the derived status for every request in
/// `request_ids`, from the priority-max over its contributing commands'
/// statuses. The `status` column is a materialized cache; this is the
/// only writer that should ever touch it.
pub async fn recompute_request_status(pool: &PgPool, request_ids: &[Uuid]) -> Result<()> {
    for request_id in request_ids {
        let rows = sqlx::query(
            r#"
            select status
            from profiling_commands
            where $1 = any(request_ids)
            "#,
        )
        .bind(request_id)
        .fetch_all(pool)
        .await
        .context("recompute_request_status: load contributing commands")?;

        let statuses = rows
            .iter()
            .map(|r| {
                let s: String = r.try_get("status")?;
                profctl_schemas::CommandStatus::from_sql(&s)
            })
            .collect::<Result<Vec<_>>>()?;

        let Some(derived) = profctl_reconcile::derive_request_status(&statuses) else {
            continue;
        };

        let completed_at: Option<DateTime<Utc>> = if matches!(
            derived,
            RequestStatus::Completed | RequestStatus::Failed
        ) {
            Some(Utc::now())
        } else {
            None
        };

        sqlx::query(
            r#"
            update profiling_requests
            set status = $2,
                completed_at = $3
            where id = $1
            "#,
        )
        .bind(request_id)
        .bind(derived.as_sql())
        .bind(completed_at)
        .execute(pool)
        .await
        .context("recompute_request_status: write back derived status")?;
    }

    Ok(())
}
