use std::sync::Arc;

use http_body_util::BodyExt;
use profctl_daemon::{routes, state::AppState};
use tower::ServiceExt;

#[tokio::test]
async fn health_reflects_actual_database_state() -> anyhow::Result<()> {
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

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/v1/health")
                .body(axum::body::Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = response.into_body().collect().await?.to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(parsed["ok"], serde_json::Value::Bool(true));
    assert_eq!(parsed["service"], "profctl-daemon");

    Ok(())
}
