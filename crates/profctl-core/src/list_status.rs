use profctl_schemas::{HostProfilingStatusRow, HostStatusFilters};
use sqlx::PgPool;

use crate::error::{CoreError, CoreResult};

pub async fn list_host_profiling_status(
    pool: &PgPool,
    filters: &HostStatusFilters,
) -> CoreResult<Vec<HostProfilingStatusRow>> {
    profctl_db::list_host_profiling_status(pool, filters)
        .await
        .map_err(CoreError::Fatal)
}
