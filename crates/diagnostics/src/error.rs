use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from store construction and run setup.
///
/// Ingestion itself is total: malformed lines, superseded output and read
/// failures are absorbed, never surfaced here.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid lint target: {0}")]
    InvalidPath(String),
}
