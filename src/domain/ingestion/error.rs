use crate::error::AppError;

/// Failures of the fetch -> normalize -> store pipeline for a single source
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("unsupported feed format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl IngestError {
    /// Upstream failures are retried on the next pass; storage failures are ours.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, IngestError::Storage(_))
    }
}
