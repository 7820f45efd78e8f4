use profctl_schemas::{CommandType, NewProfilingRequest, ProfilingConfig, ProfilingMode, RequestKind};
use profctl_reconcile::{plan_stop_for_host, StopPlan};
use std::collections::BTreeMap;
use uuid::Uuid;

/// This exercises the database half of the scenario (building the start
/// command); `plan_stop_for_host` itself is exercised in
/// `profctl-reconcile`'s unit tests, and `profctl-core` wires both
/// together for the full C3 stop path.
#[tokio::test]
async fn full_pid_coverage_plans_a_host_level_stop() -> anyhow::Result<()> {
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

    let plan = plan_stop_for_host(Some(&cmd.combined_config.pids), &[100, 200, 300]);
    assert_eq!(plan, StopPlan::DegradeToHostStop);

    Ok(())
}
