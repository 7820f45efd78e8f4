use anyhow::{Context, Result};
use profctl_schemas::{CommandStatus, CommandType, ProfilingCommand, ProfilingConfig};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::retry::{with_retry, RetryPolicy};
use crate::sql_enum::SqlEnum;

fn row_to_command(row: &sqlx::postgres::PgRow) -> Result<ProfilingCommand> {
    let command_type_str: String = row.try_get("command_type")?;
    let status_str: String = row.try_get("status")?;
    let config_json: serde_json::Value = row.try_get("combined_config")?;

    Ok(ProfilingCommand {
        command_id: row.try_get("command_id")?,
        host: row.try_get("host")?,
        service: row.try_get("service")?,
        command_type: CommandType::from_sql(&command_type_str)?,
        combined_config: serde_json::from_value(config_json).context("decode combined_config")?,
        request_ids: row.try_get("request_ids")?,
        status: CommandStatus::from_sql(&status_str)?,
        created_at: row.try_get("created_at")?,
        sent_at: row.try_get("sent_at")?,
        completed_at: row.try_get("completed_at")?,
        execution_time: row.try_get("execution_time")?,
        error_message: row.try_get("error_message")?,
        results_path: row.try_get("results_path")?,
    })
}

const COMMAND_COLUMNS: &str = "command_id, host, service, command_type, combined_config, \
    request_ids, status, created_at, sent_at, completed_at, execution_time, error_message, \
    results_path";

/// Atomically fold `incoming_config` into whatever command currently
/// occupies (host, service).
///
/// If a non-terminal row exists, its config is merged with `incoming`
/// under a row lock and `request_ids` gains `new_request_id`; the row is
/// reset to `pending` in place under a **freshly minted `command_id`**
/// (`new_command_id`) — the row's identity (`host, service`) is preserved
/// by the upsert, but the command's identity is not, so a stale delivery
/// of the old id is detectable as superseded (§4.5) and a re-dispatch
/// after this supersession gets its own `ProfilingExecution` row keyed on
/// the new id rather than overwriting the old delivery's audit record.
pub async fn upsert_command_for_host(
    pool: &PgPool,
    host: &str,
    service: &str,
    command_type: CommandType,
    incoming_config: &ProfilingConfig,
    new_command_id: Uuid,
    new_request_id: Uuid,
) -> Result<ProfilingCommand> {
    with_retry(RetryPolicy::default(), || {
        upsert_command_for_host_once(
            pool,
            host,
            service,
            command_type,
            incoming_config,
            new_command_id,
            new_request_id,
        )
    })
    .await
}

async fn upsert_command_for_host_once(
    pool: &PgPool,
    host: &str,
    service: &str,
    command_type: CommandType,
    incoming_config: &ProfilingConfig,
    new_command_id: Uuid,
    new_request_id: Uuid,
) -> Result<ProfilingCommand> {
    let mut tx = pool
        .begin()
        .await
        .context("upsert_command_for_host: begin tx")?;

    let existing = sqlx::query(
        r#"
        select command_id, combined_config, request_ids, status
        from profiling_commands
        where host = $1 and service = $2
        for update
        "#,
    )
    .bind(host)
    .bind(service)
    .fetch_optional(&mut *tx)
    .await
    .context("upsert_command_for_host: select existing")?;

    let (merged_config, request_ids) = match existing {
        Some(row) => {
            let status_str: String = row.try_get("status")?;
            let status = CommandStatus::from_sql(&status_str)?;
            let existing_config_json: serde_json::Value = row.try_get("combined_config")?;
            let existing_config: ProfilingConfig =
                serde_json::from_value(existing_config_json).context("decode existing config")?;
            let mut request_ids: Vec<Uuid> = row.try_get("request_ids")?;
            if !request_ids.contains(&new_request_id) {
                request_ids.push(new_request_id);
            }
            let merged = profctl_reconcile::merge(Some((&existing_config, status)), incoming_config);
            (merged, request_ids)
        }
        None => (incoming_config.clone(), vec![new_request_id]),
    };

    let config_json = serde_json::to_value(&merged_config).context("encode merged config")?;

    let row = sqlx::query(
        &format!(
            r#"
            insert into profiling_commands
                (command_id, host, service, command_type, combined_config, request_ids,
                 status, created_at)
            values ($1, $2, $3, $4, $5, $6, 'pending', now())
            on conflict (host, service) do update set
                command_id = excluded.command_id,
                command_type = excluded.command_type,
                combined_config = excluded.combined_config,
                request_ids = excluded.request_ids,
                status = 'pending',
                created_at = now(),
                sent_at = null,
                completed_at = null,
                execution_time = null,
                error_message = null,
                results_path = null
            returning {COMMAND_COLUMNS}
            "#
        ),
    )
    .bind(new_command_id)
    .bind(host)
    .bind(service)
    .bind(command_type.as_sql())
    .bind(&config_json)
    .bind(&request_ids)
    .fetch_one(&mut *tx)
    .await
    .context("upsert_command_for_host: upsert")?;

    tx.commit()
        .await
        .context("upsert_command_for_host: commit")?;

    row_to_command(&row)
}

/// Replace whatever command occupies (host, service) with `incoming_config`
/// verbatim, under `command_type`, without folding it against the existing
/// row's content. Used for a host-level stop: the stop supersedes the
/// running command outright rather than unioning configs with it, unlike
/// `upsert_command_for_host`'s fold-on-overlap behavior for starts.
/// `request_ids` still accumulates (the stop request itself contributed).
/// As with `upsert_command_for_host`, the row's `command_id` is always
/// replaced with `new_command_id`, even when an existing row is found.
pub async fn supersede_command_for_host(
    pool: &PgPool,
    host: &str,
    service: &str,
    command_type: CommandType,
    incoming_config: &ProfilingConfig,
    new_command_id: Uuid,
    new_request_id: Uuid,
) -> Result<ProfilingCommand> {
    with_retry(RetryPolicy::default(), || {
        supersede_command_for_host_once(
            pool,
            host,
            service,
            command_type,
            incoming_config,
            new_command_id,
            new_request_id,
        )
    })
    .await
}

async fn supersede_command_for_host_once(
    pool: &PgPool,
    host: &str,
    service: &str,
    command_type: CommandType,
    incoming_config: &ProfilingConfig,
    new_command_id: Uuid,
    new_request_id: Uuid,
) -> Result<ProfilingCommand> {
    let mut tx = pool
        .begin()
        .await
        .context("supersede_command_for_host: begin tx")?;

    let existing = sqlx::query(
        r#"
        select command_id, request_ids
        from profiling_commands
        where host = $1 and service = $2
        for update
        "#,
    )
    .bind(host)
    .bind(service)
    .fetch_optional(&mut *tx)
    .await
    .context("supersede_command_for_host: select existing")?;

    let request_ids = match existing {
        Some(row) => {
            let mut request_ids: Vec<Uuid> = row.try_get("request_ids")?;
            if !request_ids.contains(&new_request_id) {
                request_ids.push(new_request_id);
            }
            request_ids
        }
        None => vec![new_request_id],
    };

    let config_json = serde_json::to_value(incoming_config).context("encode incoming config")?;

    let row = sqlx::query(
        &format!(
            r#"
            insert into profiling_commands
                (command_id, host, service, command_type, combined_config, request_ids,
                 status, created_at)
            values ($1, $2, $3, $4, $5, $6, 'pending', now())
            on conflict (host, service) do update set
                command_id = excluded.command_id,
                command_type = excluded.command_type,
                combined_config = excluded.combined_config,
                request_ids = excluded.request_ids,
                status = 'pending',
                created_at = now(),
                sent_at = null,
                completed_at = null,
                execution_time = null,
                error_message = null,
                results_path = null
            returning {COMMAND_COLUMNS}
            "#
        ),
    )
    .bind(new_command_id)
    .bind(host)
    .bind(service)
    .bind(command_type.as_sql())
    .bind(&config_json)
    .bind(&request_ids)
    .fetch_one(&mut *tx)
    .await
    .context("supersede_command_for_host: upsert")?;

    tx.commit()
        .await
        .context("supersede_command_for_host: commit")?;

    row_to_command(&row)
}

/// Replace the pid list of the live command for (host, service) with
/// `remaining_pids`, leaving it a `start` command. Used for a process-level
/// stop that only removes some of the pids a host is profiling: unlike
/// `upsert_command_for_host`, this overwrites the pid set rather than
/// unioning it with what's already there. Returns `None` if there is no
/// live command to narrow (the stop request is then a no-op for this host).
/// Resets to `pending` under a fresh `new_command_id`, same as the other
/// supersession primitives, so the narrowed re-dispatch gets its own
/// `ProfilingExecution` row rather than overwriting the prior delivery's.
pub async fn apply_process_stop_narrowing(
    pool: &PgPool,
    host: &str,
    service: &str,
    remaining_pids: &[i64],
    new_command_id: Uuid,
    stop_request_id: Uuid,
) -> Result<Option<ProfilingCommand>> {
    with_retry(RetryPolicy::default(), || {
        apply_process_stop_narrowing_once(pool, host, service, remaining_pids, new_command_id, stop_request_id)
    })
    .await
}

async fn apply_process_stop_narrowing_once(
    pool: &PgPool,
    host: &str,
    service: &str,
    remaining_pids: &[i64],
    new_command_id: Uuid,
    stop_request_id: Uuid,
) -> Result<Option<ProfilingCommand>> {
    let mut tx = pool
        .begin()
        .await
        .context("apply_process_stop_narrowing: begin tx")?;

    let existing = sqlx::query(
        r#"
        select command_id, combined_config, request_ids
        from profiling_commands
        where host = $1 and service = $2 and status in ('pending', 'sent')
        for update
        "#,
    )
    .bind(host)
    .bind(service)
    .fetch_optional(&mut *tx)
    .await
    .context("apply_process_stop_narrowing: select existing")?;

    let Some(existing) = existing else {
        tx.commit().await?;
        return Ok(None);
    };

    let old_command_id: Uuid = existing.try_get("command_id")?;
    let existing_config_json: serde_json::Value = existing.try_get("combined_config")?;
    let mut config: ProfilingConfig =
        serde_json::from_value(existing_config_json).context("decode existing config")?;
    config.pids = remaining_pids.to_vec();
    config.normalize_pids();

    let mut request_ids: Vec<Uuid> = existing.try_get("request_ids")?;
    if !request_ids.contains(&stop_request_id) {
        request_ids.push(stop_request_id);
    }
    let config_json = serde_json::to_value(&config).context("encode narrowed config")?;

    let row = sqlx::query(
        &format!(
            r#"
            update profiling_commands
            set command_id = $1, combined_config = $2, request_ids = $3, status = 'pending',
                created_at = now(), sent_at = null, completed_at = null,
                execution_time = null, error_message = null, results_path = null
            where command_id = $4
            returning {COMMAND_COLUMNS}
            "#
        ),
    )
    .bind(new_command_id)
    .bind(&config_json)
    .bind(&request_ids)
    .bind(old_command_id)
    .fetch_one(&mut *tx)
    .await
    .context("apply_process_stop_narrowing: update")?;

    tx.commit()
        .await
        .context("apply_process_stop_narrowing: commit")?;

    Ok(Some(row_to_command(&row)?))
}

/// Transition a command to its terminal status (`completed` or `failed`)
/// and record its terminal fields. Called only when the reporting
/// completion still corresponds to the live command — a superseded
/// command must never be overwritten this way.
pub async fn mark_command_terminal(
    pool: &PgPool,
    command_id: Uuid,
    status: CommandStatus,
    completed_at: chrono::DateTime<chrono::Utc>,
    execution_time: Option<f64>,
    error_message: Option<&str>,
    results_path: Option<&str>,
) -> Result<()> {
    with_retry(RetryPolicy::default(), || async {
        sqlx::query(
            r#"
            update profiling_commands
            set status = $1, completed_at = $2, execution_time = $3,
                error_message = $4, results_path = $5
            where command_id = $6
            "#,
        )
        .bind(status.as_sql())
        .bind(completed_at)
        .bind(execution_time)
        .bind(error_message)
        .bind(results_path)
        .bind(command_id)
        .execute(pool)
        .await
        .context("mark_command_terminal failed")?;

        Ok(())
    })
    .await
}

/// The live (non-terminal) command for (host, service), if any, excluding
/// `exclude_id` when given (used to re-check after a supersession).
pub async fn get_pending_or_sent_command(
    pool: &PgPool,
    host: &str,
    service: &str,
    exclude_id: Option<Uuid>,
) -> Result<Option<ProfilingCommand>> {
    let row = sqlx::query(
        &format!(
            r#"
            select {COMMAND_COLUMNS}
            from profiling_commands
            where host = $1 and service = $2
              and status in ('pending', 'sent')
              and ($3::uuid is null or command_id <> $3)
            "#
        ),
    )
    .bind(host)
    .bind(service)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
    .context("get_pending_or_sent_command failed")?;

    row.as_ref().map(row_to_command).transpose()
}

/// Conditionally transition a `pending` command to `sent`. Idempotent: a
/// second call on an already-`sent` (or otherwise non-pending) row affects
/// zero rows and is not an error — the dispatcher treats that as
/// "already sent".
pub async fn mark_command_sent(pool: &PgPool, command_id: Uuid, host: &str) -> Result<bool> {
    with_retry(RetryPolicy::default(), || async {
        let result = sqlx::query(
            r#"
            update profiling_commands
            set status = 'sent', sent_at = now()
            where command_id = $1 and host = $2 and status = 'pending'
            "#,
        )
        .bind(command_id)
        .bind(host)
        .execute(pool)
        .await
        .context("mark_command_sent failed")?;

        Ok(result.rows_affected() > 0)
    })
    .await
}

/// The single command row for (host, service), regardless of status.
/// `UNIQUE(host, service)` guarantees there is at most one.
pub async fn get_latest_command_for_host(
    pool: &PgPool,
    host: &str,
    service: &str,
) -> Result<Option<ProfilingCommand>> {
    let row = sqlx::query(
        &format!(
            r#"
            select {COMMAND_COLUMNS}
            from profiling_commands
            where host = $1 and service = $2
            "#
        ),
    )
    .bind(host)
    .bind(service)
    .fetch_optional(pool)
    .await
    .context("get_latest_command_for_host failed")?;

    row.as_ref().map(row_to_command).transpose()
}
