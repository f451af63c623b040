use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed reading or configuration; nothing was stored.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The requested window holds fewer readings than the query needs.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Dispatch error: {0}")]
    DispatchError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
