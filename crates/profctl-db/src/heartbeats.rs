use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use profctl_schemas::HostLivenessStatus;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::retry::{with_retry, RetryPolicy};
use crate::sql_enum::SqlEnum;

/// A live host as surfaced by [`get_active_hosts`].
#[derive(Debug, Clone)]
pub struct ActiveHost {
    pub host: String,
    pub ip: String,
    pub status: HostLivenessStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub last_command_id: Option<Uuid>,
}

/// Upsert liveness on (host, service). Content (ip, status,
/// last_command_id, available_pids) is last-writer-wins; the heartbeat
/// timestamp only ever advances, via `GREATEST` against the stored value.
#[allow(clippy::too_many_arguments)]
pub async fn update_heartbeat(
    pool: &PgPool,
    host: &str,
    service: &str,
    ip: &str,
    status: HostLivenessStatus,
    last_command_id: Option<Uuid>,
    ts: DateTime<Utc>,
    available_pids: Option<&[i64]>,
) -> Result<()> {
    with_retry(RetryPolicy::default(), || async {
        sqlx::query(
            r#"
            insert into host_heartbeats
                (host, service, ip, status, last_command_id, heartbeat_timestamp, available_pids,
                 created_at, updated_at)
            values ($1, $2, $3, $4, $5, $6, $7, now(), now())
            on conflict (host, service) do update set
                ip = excluded.ip,
                status = excluded.status,
                last_command_id = excluded.last_command_id,
                heartbeat_timestamp = greatest(host_heartbeats.heartbeat_timestamp, excluded.heartbeat_timestamp),
                available_pids = excluded.available_pids,
                updated_at = now()
            "#,
        )
        .bind(host)
        .bind(service)
        .bind(ip)
        .bind(status.as_sql())
        .bind(last_command_id)
        .bind(ts)
        .bind(available_pids)
        .execute(pool)
        .await
        .context("update_heartbeat failed")?;

        Ok(())
    })
    .await
}

pub async fn get_available_pids(pool: &PgPool, host: &str, service: &str) -> Result<Option<Vec<i64>>> {
    let row: Option<(Option<Vec<i64>>,)> = sqlx::query_as(
        r#"select available_pids from host_heartbeats where host = $1 and service = $2"#,
    )
    .bind(host)
    .bind(service)
    .fetch_optional(pool)
    .await
    .context("get_available_pids failed")?;

    Ok(row.and_then(|(pids,)| pids))
}

/// Hosts whose last heartbeat falls within `liveness_window` and whose
/// status is `active`, optionally restricted to `service`.
pub async fn get_active_hosts(
    pool: &PgPool,
    service: Option<&str>,
    liveness_window: Duration,
) -> Result<Vec<ActiveHost>> {
    let window_secs = liveness_window.as_secs() as f64;

    let rows = sqlx::query(
        r#"
        select host, ip, status, last_command_id, heartbeat_timestamp
        from host_heartbeats
        where status = 'active'
          and heartbeat_timestamp >= now() - make_interval(secs => $1)
          and ($2::text is null or service = $2)
        "#,
    )
    .bind(window_secs)
    .bind(service)
    .fetch_all(pool)
    .await
    .context("get_active_hosts failed")?;

    rows.iter()
        .map(|row| {
            let status_str: String = row.try_get("status")?;
            Ok(ActiveHost {
                host: row.try_get("host")?,
                ip: row.try_get("ip")?,
                status: HostLivenessStatus::from_sql(&status_str)?,
                last_heartbeat: row.try_get("heartbeat_timestamp")?,
                last_command_id: row.try_get("last_command_id")?,
            })
        })
        .collect()
}

/// Count of currently live hosts (same liveness predicate as
/// [`get_active_hosts`]), used by the capacity gate's `active_hosts` term.
pub async fn count_active_hosts(
    pool: &PgPool,
    service: Option<&str>,
    liveness_window: Duration,
) -> Result<i64> {
    let window_secs = liveness_window.as_secs() as f64;

    let (n,): (i64,) = sqlx::query_as(
        r#"
        select count(*)::bigint
        from host_heartbeats
        where status = 'active'
          and heartbeat_timestamp >= now() - make_interval(secs => $1)
          and ($2::text is null or service = $2)
        "#,
    )
    .bind(window_secs)
    .bind(service)
    .fetch_one(pool)
    .await
    .context("count_active_hosts failed")?;

    Ok(n)
}

/// Count of hosts with a live (`pending`/`sent`) `start` command, excluding
/// `exclude_hosts` — the capacity gate's
/// `currently_profiling_outside_selection` term.
pub async fn count_active_profiling_hosts(
    pool: &PgPool,
    service: Option<&str>,
    exclude_hosts: &[String],
) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as(
        r#"
        select count(*)::bigint
        from profiling_commands
        where command_type = 'start'
          and status in ('pending', 'sent')
          and ($1::text is null or service = $1)
          and not (host = any($2))
        "#,
    )
    .bind(service)
    .bind(exclude_hosts)
    .fetch_one(pool)
    .await
    .context("count_active_profiling_hosts failed")?;

    Ok(n)
}
