use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("source not found")]
    NotFound,
    /// Fetching or parsing the feed failed; the source keeps its old timestamp
    #[error("upstream feed error: {0}")]
    Upstream(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RefreshError> for AppError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::NotFound => AppError::NotFound("Source not found".to_string()),
            RefreshError::Upstream(msg) => AppError::BadGateway(msg),
            RefreshError::Dependency(msg) => AppError::Internal(msg),
            RefreshError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
