#[tokio::test]
async fn migrate_runs_twice_without_error() -> anyhow::Result<()> {
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
    profctl_db::migrate(&pool).await?;

    let status = profctl_db::status(&pool).await?;
    assert!(status.ok);
    assert!(status.has_profiling_requests_table);

    Ok(())
}
