use thiserror::Error;

/// Result type for collaborator calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Collaborator-layer errors.
///
/// `NotFound` is the only variant the engine recovers from (missing record
/// ⇒ stop processing, missing rule documents ⇒ empty configuration); every
/// other variant propagates to the caller unretried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}
