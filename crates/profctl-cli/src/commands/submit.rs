//! `profctl submit` — builds a `NewProfilingRequest` from CLI flags and
//! runs it through the same `submit_profiling_request` entry point the
//! daemon's `POST /v1/profiling/requests` route calls.

use anyhow::Result;
use profctl_config::CoreConfig;
use profctl_schemas::{NewProfilingRequest, ProfilingMode, RequestKind, StopLevel};
use sqlx::PgPool;

use super::{parse_additional_args, parse_targets};

pub struct SubmitInput {
    pub kind: RequestKind,
    pub service: String,
    pub duration_seconds: i64,
    pub frequency_hz: i64,
    pub mode: ProfilingMode,
    pub continuous: bool,
    pub raw_targets: Vec<String>,
    pub raw_additional_args: Option<String>,
    pub stop_level: Option<StopLevel>,
}

pub async fn run(pool: &PgPool, config: &CoreConfig, input: SubmitInput) -> Result<()> {
    let req = NewProfilingRequest {
        kind: input.kind,
        service: input.service,
        duration_seconds: input.duration_seconds,
        frequency_hz: input.frequency_hz,
        mode: input.mode,
        continuous: input.continuous,
        additional_args: parse_additional_args(input.raw_additional_args.as_deref())?,
        targets: parse_targets(&input.raw_targets)?,
        stop_level: input.stop_level,
    };

    let resp = profctl_core::submit_profiling_request(pool, config, &req).await?;

    println!("request_id={}", resp.request_id);
    println!("command_ids={:?}", resp.command_ids);
    if let Some(eta) = resp.estimated_completion_time {
        println!("estimated_completion_time={eta}");
    }

    Ok(())
}
