use cascade_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors.
///
/// Matching itself never fails; every boolean decision terminates with an
/// answer. The engine only surfaces collaborator failures, and recovers
/// not-found conditions before they reach this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
