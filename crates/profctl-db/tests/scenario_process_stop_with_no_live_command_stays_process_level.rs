use profctl_reconcile::{plan_stop_for_host, StopPlan};
use profctl_schemas::{CommandType, NewProfilingRequest, ProfilingConfig, ProfilingMode, RequestKind};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A process-level stop against a host with no live `start` command (or an
/// unknown/empty PID set) has nothing to narrow — it stays a process-level
/// stop carrying the requested PIDs rather than widening into a host-level
/// stop, matching the original's default branch
/// (`db_manager.py::create_process_stop_command`, the fallthrough past its
/// `if current_pids:` check).
#[tokio::test]
async fn no_live_start_command_inserts_a_process_level_stop() -> anyhow::Result<()> {
    let url = match std::env::var(profctl_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: PROFCTL_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;
    profctl_db::migrate(&pool).await?;

    let service = format!("svc-{}", Uuid::new_v4());
    let host = "h1".to_string();

    assert!(profctl_db::get_latest_command_for_host(&pool, &host, &service)
        .await?
        .is_none());

    let plan = plan_stop_for_host(None, &[100, 200]);
    assert_eq!(plan, StopPlan::ProcessStopWithRequestedPids);

    let stop_req = NewProfilingRequest {
        kind: RequestKind::Stop,
        service: service.clone(),
        duration_seconds: 60,
        frequency_hz: 11,
        mode: ProfilingMode::Cpu,
        continuous: false,
        additional_args: Default::default(),
        targets: {
            let mut t = BTreeMap::new();
            t.insert(host.clone(), Some(vec![100, 200]));
            t
        },
        stop_level: Some(profctl_schemas::StopLevel::Process),
    };
    let stop_req_id = profctl_db::insert_request(&pool, &stop_req).await?;

    let incoming = ProfilingConfig {
        duration_seconds: 60,
        frequency_hz: 11,
        mode: ProfilingMode::Cpu,
        continuous: false,
        pids: vec![100, 200],
        stop_level: Some(profctl_schemas::StopLevel::Process),
        extras: Default::default(),
    };

    let cmd = profctl_db::supersede_command_for_host(
        &pool,
        &host,
        &service,
        CommandType::Stop,
        &incoming,
        Uuid::new_v4(),
        stop_req_id,
    )
    .await?;

    assert_eq!(cmd.command_type, CommandType::Stop);
    assert_eq!(cmd.combined_config.stop_level, Some(profctl_schemas::StopLevel::Process));
    assert_eq!(cmd.combined_config.pids, vec![100, 200]);

    Ok(())
}
