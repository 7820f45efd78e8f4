//! Shared runtime state for `profctl-daemon`.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; the pool and config
//! are the only two things every route needs, and both are cheap to clone
//! (`PgPool` is itself a handle, `CoreConfig` is a handful of scalars).

use profctl_config::CoreConfig;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: CoreConfig,
}

impl AppState {
    pub fn new(pool: PgPool, config: CoreConfig) -> Self {
        Self { pool, config }
    }
}
