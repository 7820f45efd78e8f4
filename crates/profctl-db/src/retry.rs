//! Centralized retry policy for transient Postgres errors.
//!
//! Every persistence primitive routes its query through [`with_retry`]
//! instead of retrying ad hoc at call sites.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

/// Postgres error codes considered transient and worth retrying:
/// `40001` (serialization_failure), `40P01` (deadlock_detected).
fn is_transient(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        Some(sqlx::Error::Io(_)) | Some(sqlx::Error::PoolTimedOut) => true,
        _ => false,
    }
}

/// Run `op` with exponential backoff on transient errors, up to
/// `policy.max_attempts` total attempts. Non-transient errors propagate
/// immediately without retrying.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                let delay = policy.base_delay * 2u32.pow(attempt - 1);
                tracing::warn!(attempt, error = %e, "transient db error, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
