use thiserror::Error;

/// Typed boundary error for every public operation in this crate. The
/// daemon maps each variant to an HTTP status; the CLI prints `message`
/// and exits non-zero.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient failure, retry: {0}")]
    Transient(#[source] anyhow::Error),

    #[error("internal error: {0}")]
    Fatal(#[source] anyhow::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Any unlabeled storage failure becomes `Fatal` by default. Call sites that
/// know a particular failure is retryable should construct `Transient`
/// explicitly instead of relying on this conversion.
impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Fatal(err)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
