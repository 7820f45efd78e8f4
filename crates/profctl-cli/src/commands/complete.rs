//! `profctl complete` — reports the outcome of a dispatched command, for
//! exercising the Completion Handler locally without an agent.

use anyhow::Result;
use profctl_schemas::{CompletionOutcome, ReportCompletionRequest};
use sqlx::PgPool;
use uuid::Uuid;

pub struct CompleteInput {
    pub command_id: Uuid,
    pub host: String,
    pub status: CompletionOutcome,
    pub execution_time: Option<f64>,
    pub error: Option<String>,
    pub results_path: Option<String>,
}

pub async fn run(pool: &PgPool, input: CompleteInput) -> Result<()> {
    let req = ReportCompletionRequest {
        command_id: input.command_id,
        host: input.host,
        status: input.status,
        execution_time: input.execution_time,
        error: input.error,
        results_path: input.results_path,
    };

    let resp = profctl_core::report_command_completion(pool, &req).await?;
    println!("success={} message={}", resp.success, resp.message);

    Ok(())
}
