use anyhow::{Context, Result};
use profctl_schemas::{CommandStatus, CommandType, HostProfilingStatusRow, HostStatusFilters};
use sqlx::{PgPool, Row};

use crate::sql_enum::SqlEnum;

/// Join heartbeats with their current command to answer host-status
/// queries, mirroring the original's `JOIN`-based host-status view.
pub async fn list_host_profiling_status(
    pool: &PgPool,
    filters: &HostStatusFilters,
) -> Result<Vec<HostProfilingStatusRow>> {
    let status_filters: Vec<&'static str> = filters.statuses.iter().map(|s| s.as_sql()).collect();
    let type_filters: Vec<&'static str> = filters
        .command_types
        .iter()
        .map(|t| t.as_sql())
        .collect();

    let rows = sqlx::query(
        r#"
        select
            hb.service as service,
            hb.host as host,
            hb.ip as ip,
            cmd.combined_config -> 'pids' as pids,
            cmd.command_type as command_type,
            cmd.status as status,
            hb.heartbeat_timestamp as last_heartbeat
        from host_heartbeats hb
        left join profiling_commands cmd
            on cmd.host = hb.host and cmd.service = hb.service
        where ($1::text is null or hb.service = $1)
          and ($2::text is null or hb.host ilike '%' || $2 || '%')
          and ($3::text is null or hb.ip like $3 || '%')
          and (array_length($4::text[], 1) is null or cmd.status = any($4))
          and (array_length($5::text[], 1) is null or cmd.command_type = any($5))
          and (
              $6::bigint is null
              or (cmd.combined_config -> 'pids') @> to_jsonb($6::bigint)
          )
        order by hb.service, hb.host
        "#,
    )
    .bind(&filters.service)
    .bind(&filters.hostname_substring)
    .bind(&filters.ip_prefix)
    .bind(&status_filters)
    .bind(&type_filters)
    .bind(filters.pid)
    .fetch_all(pool)
    .await
    .context("list_host_profiling_status failed")?;

    rows.iter()
        .map(|row| {
            let pids_json: Option<serde_json::Value> = row.try_get("pids")?;
            let pids: Vec<i64> = match pids_json {
                Some(v) => serde_json::from_value(v).unwrap_or_default(),
                None => Vec::new(),
            };
            let command_type: Option<String> = row.try_get("command_type")?;
            let status: Option<String> = row.try_get("status")?;

            Ok(HostProfilingStatusRow {
                service: row.try_get("service")?,
                host: row.try_get("host")?,
                ip: row.try_get("ip")?,
                pids,
                command_type: command_type
                    .map(|s| CommandType::from_sql(&s))
                    .transpose()?,
                status: status.map(|s| CommandStatus::from_sql(&s)).transpose()?,
                last_heartbeat: row.try_get("last_heartbeat")?,
            })
        })
        .collect()
}
