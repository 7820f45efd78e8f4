//! `profctl-daemon` entry point.
//!
//! Thin by design: load configuration, connect to Postgres, run embedded
//! migrations, build the router, attach tracing middleware, serve. All
//! route handlers live in `routes.rs`; all shared state lives in `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use profctl_daemon::{routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev-time .env.local bootstrap; silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config = profctl_config::CoreConfig::from_env().context("loading configuration")?;
    let pool = profctl_db::connect_from_env().await.context("connecting to database")?;
    profctl_db::migrate(&pool).await.context("running database migrations")?;

    let addr: std::net::SocketAddr = config
        .daemon_addr
        .parse()
        .with_context(|| format!("invalid PROFCTL_DAEMON_ADDR '{}'", config.daemon_addr))?;

    let shared = Arc::new(AppState::new(pool, config));

    let app = routes::build_router(shared).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    info!("profctl-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
