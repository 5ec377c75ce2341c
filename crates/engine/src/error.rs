//! Engine-level error type.

use domain::services::StoreError;

/// Errors surfaced by engine operations. Background jobs downgrade these to
/// log lines so one bad cycle never kills the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid payload: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
