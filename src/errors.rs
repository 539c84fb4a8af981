use thiserror::Error;

/// Error type shared by the ledger, storage, and configuration layers.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type FinanceResult<T> = Result<T, FinanceError>;
