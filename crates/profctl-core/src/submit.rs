//! `SubmitProfilingRequest` / `SubmitBulkProfilingRequests` — the operator
//! facing entry points into the Command Reconciler.

use profctl_config::CoreConfig;
use profctl_schemas::{
    BulkItemResult, NewProfilingRequest, SubmitBulkRequest, SubmitBulkResponse,
    SubmitProfilingRequestResponse,
};
use sqlx::PgPool;

use crate::error::{CoreError, CoreResult};
use crate::reconcile::{estimated_completion_time, reconcile_request};

/// Validate, persist, and reconcile a single request. Bypasses the
/// capacity gate — only bulk submissions are gated.
pub async fn submit_profiling_request(
    pool: &PgPool,
    config: &CoreConfig,
    req: &NewProfilingRequest,
) -> CoreResult<SubmitProfilingRequestResponse> {
    validate_request(req)?;

    let request_id = profctl_db::insert_request(pool, req).await.map_err(CoreError::Fatal)?;
    let command_ids = reconcile_request(pool, req, request_id, config.heartbeat_liveness_window).await?;

    Ok(SubmitProfilingRequestResponse {
        request_id,
        command_ids,
        estimated_completion_time: estimated_completion_time(req),
    })
}

/// Validate and (unless `dry_run`) submit every request in `batch`, gated
/// as a whole by the fleet capacity check (C6). Only `start` requests count
/// toward the gate: one with an explicit host list counts by its target
/// count, one targeting "all active hosts" counts by the resolved
/// active-host count at gate-check time. `stop` requests in the batch are
/// submitted but never consume capacity.
pub async fn submit_bulk_profiling_requests(
    pool: &PgPool,
    config: &CoreConfig,
    batch: &SubmitBulkRequest,
) -> CoreResult<SubmitBulkResponse> {
    for req in &batch.requests {
        validate_request(req)?;
    }

    let target_hosts = bulk_target_hosts(pool, config, batch).await?;
    check_capacity(pool, config, target_hosts.len() as u32, &target_hosts).await?;

    if batch.dry_run {
        let results = batch
            .requests
            .iter()
            .enumerate()
            .map(|(index, _)| BulkItemResult {
                index,
                request_id: None,
                command_ids: Vec::new(),
                error: None,
            })
            .collect();
        return Ok(SubmitBulkResponse { results });
    }

    let mut results = Vec::with_capacity(batch.requests.len());
    for (index, req) in batch.requests.iter().enumerate() {
        let outcome = submit_profiling_request(pool, config, req).await;
        results.push(match outcome {
            Ok(resp) => BulkItemResult {
                index,
                request_id: Some(resp.request_id),
                command_ids: resp.command_ids,
                error: None,
            },
            Err(err) => BulkItemResult {
                index,
                request_id: None,
                command_ids: Vec::new(),
                error: Some(err.to_string()),
            },
        });
    }

    Ok(SubmitBulkResponse { results })
}

/// The distinct set of hosts this batch would *start* profiling, resolving
/// "all active hosts" requests the same way the reconciler itself would.
/// Deduplicated across requests so a host targeted twice in one batch isn't
/// double-counted against the fleet cap.
///
/// `stop` requests never increase simultaneous-profiling load, so they're
/// skipped here — matching the original's `validate_profiling_capacity`,
/// which short-circuits to "valid" whenever `request_type != "start"`
/// (`dynamic_profiling_utils.py:48-50`) rather than gating on them at all.
async fn bulk_target_hosts(
    pool: &PgPool,
    config: &CoreConfig,
    batch: &SubmitBulkRequest,
) -> CoreResult<Vec<String>> {
    let mut hosts = std::collections::BTreeSet::new();
    for req in &batch.requests {
        if req.kind != profctl_schemas::RequestKind::Start {
            continue;
        }
        if !req.targets.is_empty() {
            hosts.extend(req.targets.keys().cloned());
        } else {
            let active = profctl_db::get_active_hosts(pool, Some(&req.service), config.heartbeat_liveness_window)
                .await
                .map_err(CoreError::Fatal)?;
            hosts.extend(active.into_iter().map(|h| h.host));
        }
    }
    Ok(hosts.into_iter().collect())
}

/// Checks the fleet-wide cap: hosts already profiling *outside* this
/// batch's own target set, plus the batch's size, must not exceed
/// `floor(active_hosts * bulk_cap_percent / 100)`. Excluding the batch's
/// own targets avoids double-counting a host that is already profiling and
/// is also targeted again by this submission.
async fn check_capacity(
    pool: &PgPool,
    config: &CoreConfig,
    requested_size: u32,
    target_hosts: &[String],
) -> CoreResult<()> {
    let active_hosts = profctl_db::count_active_hosts(pool, None, config.heartbeat_liveness_window)
        .await
        .map_err(CoreError::Fatal)?;
    let currently_profiling = profctl_db::count_active_profiling_hosts(pool, None, target_hosts)
        .await
        .map_err(CoreError::Fatal)?;

    let check = profctl_reconcile::bulk_within_capacity(
        active_hosts as u32,
        config.bulk_cap_percent,
        currently_profiling as u32,
        requested_size,
    );

    if let Some(ceiling) = config.bulk_cap_hosts {
        if requested_size > ceiling {
            return Err(CoreError::capacity(format!(
                "bulk request size {requested_size} exceeds absolute host ceiling {ceiling}"
            )));
        }
    }

    if !check.allowed() {
        return Err(CoreError::capacity(format!(
            "bulk request would profile {} hosts ({} already profiling outside this selection); \
             fleet cap is {} of {} active hosts",
            check.requested_size, check.currently_profiling_outside_selection,
            check.max_profiling_hosts, active_hosts
        )));
    }

    Ok(())
}

fn validate_request(req: &NewProfilingRequest) -> CoreResult<()> {
    if req.duration_seconds <= 0 {
        return Err(CoreError::validation("duration_seconds must be > 0"));
    }
    if req.frequency_hz <= 0 {
        return Err(CoreError::validation("frequency_hz must be > 0"));
    }
    Ok(())
}
