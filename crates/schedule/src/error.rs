//! Schedule service errors.

use dayblocks_core::{BlockId, BlockStatus, TransitionError, ValidationError};
use dayblocks_storage::StorageError;

/// Result alias for schedule operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors from the schedule service.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// No block with this id
    #[error("Block not found: {0}")]
    NotFound(BlockId),

    /// The block violates one or more field invariants
    #[error("Invalid block: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// The block overlaps others on the same day
    #[error("Block overlaps {} other block(s)", .0.len())]
    Conflict(Vec<BlockId>),

    /// The state machine refused the change
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// The block changed status since the caller last read it
    #[error("Status changed concurrently: expected {expected}, found {actual}")]
    StatusMismatch {
        /// Status the caller assumed
        expected: BlockStatus,
        /// Status found in the store
        actual: BlockStatus,
    },

    /// Underlying store failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
