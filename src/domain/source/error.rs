use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum SourceServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("feed could not be validated: {0}")]
    InvalidSource(String),
    #[error("source not found")]
    NotFound,
    #[error("source already exists")]
    Conflict,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AppError> for SourceServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => SourceServiceError::Invalid(msg),
            AppError::NotFound(_) => SourceServiceError::NotFound,
            AppError::Conflict(_) => SourceServiceError::Conflict,
            AppError::Forbidden(msg) => SourceServiceError::Forbidden(msg),
            _ => SourceServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<SourceServiceError> for AppError {
    fn from(err: SourceServiceError) -> Self {
        match err {
            SourceServiceError::Invalid(msg) => AppError::BadRequest(msg),
            SourceServiceError::InvalidSource(msg) => {
                AppError::BadRequest(format!("Feed could not be validated: {}", msg))
            }
            SourceServiceError::NotFound => AppError::NotFound("Source not found".to_string()),
            SourceServiceError::Conflict => {
                AppError::Conflict("Source URL already exists".to_string())
            }
            SourceServiceError::Forbidden(msg) => AppError::Forbidden(msg),
            SourceServiceError::Dependency(msg) => AppError::Internal(msg),
            SourceServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
