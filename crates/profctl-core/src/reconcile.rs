//! Command Reconciler: folds a newly persisted request into the
//! per-(host, service) effective command.

use std::time::Duration;

use chrono::Utc;
use profctl_schemas::{CommandType, NewProfilingRequest, ProfilingConfig, RequestKind, StopLevel};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Target hosts for a request: its explicit `targets` keys if any,
/// otherwise every currently-active host for the service.
async fn resolve_target_hosts(
    pool: &PgPool,
    req: &NewProfilingRequest,
    liveness_window: Duration,
) -> CoreResult<Vec<String>> {
    if !req.targets.is_empty() {
        return Ok(req.targets.keys().cloned().collect());
    }

    let active = profctl_db::get_active_hosts(pool, Some(&req.service), liveness_window)
        .await
        .map_err(CoreError::Fatal)?;
    let hosts: Vec<String> = active.into_iter().map(|h| h.host).collect();

    if hosts.is_empty() && req.kind == RequestKind::Stop {
        return Err(CoreError::validation(
            "stop requests require explicit targets when no host is currently active",
        ));
    }

    Ok(hosts)
}

fn pids_for_host(req: &NewProfilingRequest, host: &str) -> Vec<i64> {
    req.targets.get(host).cloned().flatten().unwrap_or_default()
}

fn base_config(req: &NewProfilingRequest, host: &str) -> ProfilingConfig {
    let mut config = ProfilingConfig {
        duration_seconds: req.duration_seconds,
        frequency_hz: req.frequency_hz,
        mode: req.mode,
        continuous: req.continuous,
        pids: pids_for_host(req, host),
        stop_level: req.stop_level,
        extras: req.additional_args.clone(),
    };
    config.normalize_pids();
    config
}

/// Fold `request_id` (already persisted as `req`) into every target host's
/// command. Returns the command ids touched, in target-host order.
pub async fn reconcile_request(
    pool: &PgPool,
    req: &NewProfilingRequest,
    request_id: Uuid,
    liveness_window: Duration,
) -> CoreResult<Vec<Uuid>> {
    let hosts = resolve_target_hosts(pool, req, liveness_window).await?;
    let mut command_ids = Vec::with_capacity(hosts.len());

    for host in &hosts {
        let incoming = base_config(req, host);
        let command_id = reconcile_one_host(pool, host, req, &incoming, request_id).await?;
        command_ids.push(command_id);
    }

    Ok(command_ids)
}

async fn reconcile_one_host(
    pool: &PgPool,
    host: &str,
    req: &NewProfilingRequest,
    incoming: &ProfilingConfig,
    request_id: Uuid,
) -> CoreResult<Uuid> {
    match req.kind {
        RequestKind::Start => {
            let cmd = profctl_db::upsert_command_for_host(
                pool,
                host,
                &req.service,
                CommandType::Start,
                incoming,
                Uuid::new_v4(),
                request_id,
            )
            .await
            .map_err(CoreError::Fatal)?;
            Ok(cmd.command_id)
        }
        RequestKind::Stop => reconcile_stop(pool, host, req, incoming, request_id).await,
    }
}

async fn reconcile_stop(
    pool: &PgPool,
    host: &str,
    req: &NewProfilingRequest,
    incoming: &ProfilingConfig,
    request_id: Uuid,
) -> CoreResult<Uuid> {
    match req.stop_level {
        None | Some(StopLevel::Host) => {
            let cmd = profctl_db::supersede_command_for_host(
                pool,
                host,
                &req.service,
                CommandType::Stop,
                incoming,
                Uuid::new_v4(),
                request_id,
            )
            .await
            .map_err(CoreError::Fatal)?;
            Ok(cmd.command_id)
        }
        Some(StopLevel::Process) => reconcile_process_stop(pool, host, req, incoming, request_id).await,
    }
}

async fn reconcile_process_stop(
    pool: &PgPool,
    host: &str,
    req: &NewProfilingRequest,
    incoming: &ProfilingConfig,
    request_id: Uuid,
) -> CoreResult<Uuid> {
    let current = profctl_db::get_latest_command_for_host(pool, host, &req.service)
        .await
        .map_err(CoreError::Fatal)?;

    let current_pids = current
        .as_ref()
        .filter(|c| c.command_type == CommandType::Start && c.status.is_live())
        .map(|c| c.combined_config.pids.clone());

    let plan = match &current_pids {
        Some(pids) => profctl_reconcile::plan_stop_for_host(Some(pids), &incoming.pids),
        None => profctl_reconcile::plan_stop_for_host(None, &incoming.pids),
    };

    match plan {
        profctl_reconcile::StopPlan::NarrowToRemaining { remaining } => {
            let narrowed = profctl_db::apply_process_stop_narrowing(
                pool,
                host,
                &req.service,
                &remaining,
                Uuid::new_v4(),
                request_id,
            )
            .await
            .map_err(CoreError::Fatal)?;

            match narrowed {
                Some(cmd) => Ok(cmd.command_id),
                None => {
                    warn!(%host, service = %req.service, "process stop narrowed to no-op: no live command to narrow");
                    let cmd = profctl_db::supersede_command_for_host(
                        pool,
                        host,
                        &req.service,
                        CommandType::Stop,
                        incoming,
                        Uuid::new_v4(),
                        request_id,
                    )
                    .await
                    .map_err(CoreError::Fatal)?;
                    Ok(cmd.command_id)
                }
            }
        }
        profctl_reconcile::StopPlan::DegradeToHostStop => {
            let mut host_stop_config = incoming.clone();
            host_stop_config.stop_level = Some(StopLevel::Host);
            let cmd = profctl_db::supersede_command_for_host(
                pool,
                host,
                &req.service,
                CommandType::Stop,
                &host_stop_config,
                Uuid::new_v4(),
                request_id,
            )
            .await
            .map_err(CoreError::Fatal)?;
            Ok(cmd.command_id)
        }
        // No live start command to narrow (or its PID set is unknown/empty):
        // stays a process-level stop carrying the requested PIDs rather than
        // widening into a host-level stop — there is nothing known to be
        // "the rest of the host" here, so host-level stop would over-reach.
        profctl_reconcile::StopPlan::ProcessStopWithRequestedPids => {
            let cmd = profctl_db::supersede_command_for_host(
                pool,
                host,
                &req.service,
                CommandType::Stop,
                incoming,
                Uuid::new_v4(),
                request_id,
            )
            .await
            .map_err(CoreError::Fatal)?;
            Ok(cmd.command_id)
        }
    }
}

/// Best-effort estimate surfaced in `SubmitProfilingRequestResponse`; not a
/// scheduling guarantee.
pub fn estimated_completion_time(req: &NewProfilingRequest) -> Option<chrono::DateTime<chrono::Utc>> {
    if req.continuous {
        return None;
    }
    Some(Utc::now() + chrono::Duration::seconds(req.duration_seconds))
}
