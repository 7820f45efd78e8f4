use profctl_reconcile::{plan_stop_for_host, StopPlan};
use profctl_schemas::{CommandType, NewProfilingRequest, ProfilingConfig, ProfilingMode, RequestKind};
use std::collections::BTreeMap;
use uuid::Uuid;

#[tokio::test]
async fn stopping_a_subset_of_pids_narrows_the_running_command() -> anyhow::Result<()> {
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

    let mut targets = BTreeMap::new();
    targets.insert(host.clone(), Some(vec![100, 200, 300]));
    let req = NewProfilingRequest {
        kind: RequestKind::Start,
        service: service.clone(),
        duration_seconds: 120,
        frequency_hz: 11,
        mode: ProfilingMode::Cpu,
        continuous: false,
        additional_args: Default::default(),
        targets,
        stop_level: None,
    };
    let req_id = profctl_db::insert_request(&pool, &req).await?;

    let cfg = ProfilingConfig {
        duration_seconds: 120,
        frequency_hz: 11,
        mode: ProfilingMode::Cpu,
        continuous: false,
        pids: vec![100, 200, 300],
        stop_level: None,
        extras: Default::default(),
    };
    let cmd = profctl_db::upsert_command_for_host(
        &pool,
        &host,
        &service,
        CommandType::Start,
        &cfg,
        Uuid::new_v4(),
        req_id,
    )
    .await?;

    let plan = plan_stop_for_host(Some(&cmd.combined_config.pids), &[200]);
    let remaining = match plan {
        StopPlan::NarrowToRemaining { remaining } => remaining,
        other => panic!("expected a narrowed remaining set, got {other:?}"),
    };
    assert_eq!(remaining, vec![100, 300]);

    let stop_req = NewProfilingRequest {
        kind: RequestKind::Stop,
        service: service.clone(),
        duration_seconds: cfg.duration_seconds,
        frequency_hz: cfg.frequency_hz,
        mode: cfg.mode,
        continuous: cfg.continuous,
        additional_args: Default::default(),
        targets: {
            let mut t = BTreeMap::new();
            t.insert(host.clone(), Some(vec![200]));
            t
        },
        stop_level: Some(profctl_schemas::StopLevel::Process),
    };
    let stop_req_id = profctl_db::insert_request(&pool, &stop_req).await?;

    // The narrowed set replaces the command's pid list in place; it stays a
    // start command (the host keeps profiling 100 and 300), pending, but
    // under a freshly minted command_id — the narrowing is a re-dispatch,
    // so the agent's next heartbeat must see a new id to re-deliver.
    let new_id = Uuid::new_v4();
    let updated =
        profctl_db::apply_process_stop_narrowing(&pool, &host, &service, &remaining, new_id, stop_req_id)
            .await?
            .expect("a live command exists to narrow");

    assert_eq!(updated.command_id, new_id);
    assert_ne!(updated.command_id, cmd.command_id);
    assert_eq!(updated.command_type, CommandType::Start);
    assert_eq!(updated.combined_config.pids, vec![100, 300]);
    assert_eq!(updated.status, profctl_schemas::CommandStatus::Pending);

    Ok(())
}
