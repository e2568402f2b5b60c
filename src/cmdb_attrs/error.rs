use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttrError {
    #[error("Attribute <{0}> does not exist")]
    NotFound(String),

    #[error("attribute name <{0}> is duplicated")]
    DuplicateName(String),

    #[error("attribute alias <{0}> is duplicated")]
    DuplicateAlias(String),

    /// Commit failed and the transaction was rolled back. The underlying
    /// cause is logged, never carried to the caller.
    #[error("{0}")]
    WriteFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("unique constraint violated on {column}: <{value}>")]
    UniqueViolation { column: &'static str, value: String },

    #[error("transaction conflict: started at revision {expected}, store is at {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AttrError>;
