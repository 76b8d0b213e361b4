use thiserror::Error;

#[derive(Debug, Error)]
pub enum PharmlensError {
    #[error("Invalid risk record: {0}")]
    InvalidRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PharmlensError>;
