//! profctl-db
//!
//! Durable storage for the Request-to-Command Reconciliation Core:
//! profiling requests, the per-(host, service) commands derived from
//! them, per-delivery execution records, and host heartbeats. Every
//! primitive here is the one place its table is written from — callers
//! never issue ad hoc SQL against these tables elsewhere in the
//! workspace.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub const ENV_DB_URL: &str = "PROFCTL_DATABASE_URL";

mod commands;
mod executions;
mod heartbeats;
mod host_status;
mod requests;
mod retry;
mod sql_enum;

pub use commands::{
    apply_process_stop_narrowing, get_latest_command_for_host, get_pending_or_sent_command,
    mark_command_sent, mark_command_terminal, supersede_command_for_host, upsert_command_for_host,
};
pub use executions::{get_execution, record_execution};
pub use heartbeats::{
    count_active_hosts, count_active_profiling_hosts, get_active_hosts, get_available_pids,
    update_heartbeat, ActiveHost,
};
pub use host_status::list_host_profiling_status;
pub use requests::{get_host_pid_mapping, get_request, insert_request, recompute_request_status};
pub use retry::{with_retry, RetryPolicy};
pub use sql_enum::SqlEnum;

/// Connect to Postgres using `PROFCTL_DATABASE_URL`.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Test helper: connect using `PROFCTL_DATABASE_URL` and ensure migrations
/// are applied.
pub async fn testkit_db_pool() -> Result<PgPool> {
    let pool = connect_from_env().await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded sqlx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_profiling_requests_table: bool,
}

/// Connectivity + schema-presence check, used by the CLI's `db status`
/// command and the daemon's `/v1/health` route.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = 'public' and table_name = 'profiling_requests'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_profiling_requests_table: exists,
    })
}
