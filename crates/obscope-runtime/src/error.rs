//! Crate-wide error type for the runtime layer, `thiserror`-derived per
//! SPEC_FULL's ambient-stack convention (matching `obscope-index::error`).

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("plan history / label store error: {0}")]
    Index(#[from] obscope_index::error::Error),

    #[error("provider error: {0}")]
    Provider(#[from] obscope_providers::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("workspace not initialized: {0}")]
    NotInitialized(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}
