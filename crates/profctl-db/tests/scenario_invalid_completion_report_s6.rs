use uuid::Uuid;

/// Reporting completion for a (command_id, host) pair with no prior
/// `assigned` execution row has nothing to validate against at the storage
/// layer: the row such a report is meant to confirm simply isn't there.
/// Rejecting the report itself is a C5 concern; this confirms the
/// primitive that rejection is built on.
#[tokio::test]
async fn completion_for_an_unassigned_command_host_pair_finds_no_execution() -> anyhow::Result<()> {
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

    let bogus_command_id = Uuid::new_v4();
    let host = format!("h-{}", Uuid::new_v4());

    let found = profctl_db::get_execution(&pool, bogus_command_id, &host).await?;
    assert!(found.is_none(), "no assignment means nothing to validate the report against");

    Ok(())
}
