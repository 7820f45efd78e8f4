//! S6: a completion report against an unknown (command_id, host) pair is
//! rejected with a 4xx status and leaves no rows changed.

use std::sync::Arc;

use http_body_util::BodyExt;
use profctl_daemon::{routes, state::AppState};
use profctl_schemas::{CompletionOutcome, ReportCompletionRequest};
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn unknown_command_completion_returns_bad_request() -> anyhow::Result<()> {
    let url = match std::env::var(profctl_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: PROFCTL_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new().max_connections(2).connect(&url).await?;
    profctl_db::migrate(&pool).await?;

    let config = profctl_config::CoreConfig {
        database_url: url,
        heartbeat_liveness_window: std::time::Duration::from_secs(600),
        bulk_cap_percent: 20,
        bulk_cap_hosts: None,
        daemon_addr: "0.0.0.0:0".to_string(),
    };
    let state = Arc::new(AppState::new(pool, config));
    let app = routes::build_router(state);

    let body = ReportCompletionRequest {
        command_id: Uuid::new_v4(),
        host: "daemon-h1".to_string(),
        status: CompletionOutcome::Completed,
        execution_time: None,
        error: None,
        results_path: None,
    };

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/v1/profiling/completions")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(serde_json::to_vec(&body)?))?,
        )
        .await?;

    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await?.to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert!(parsed["error"].as_str().unwrap().contains("not found for host"));

    Ok(())
}
