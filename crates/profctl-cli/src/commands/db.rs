//! `profctl db status` / `profctl db migrate`.

use anyhow::Result;
use sqlx::PgPool;

pub async fn status(pool: &PgPool) -> Result<()> {
    let s = profctl_db::status(pool).await?;
    println!("db_ok={} has_profiling_requests_table={}", s.ok, s.has_profiling_requests_table);
    Ok(())
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    profctl_db::migrate(pool).await?;
    println!("migrations_applied=true");
    Ok(())
}
