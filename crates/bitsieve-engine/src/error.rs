//! Execution errors.

use bitsieve_core::RowHandle;

/// Errors surfaced while a backend runs a checked plan.
///
/// Partial results may already have reached the sink; callers keep them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// Strict residency mode and the index cannot serve the row.
    #[error("row {0} is not resident in the index")]
    RowNotResident(RowHandle),

    /// The caller's cancel predicate fired.
    #[error("evaluation cancelled")]
    Cancelled,

    /// The supplied deadline passed.
    #[error("evaluation deadline exceeded")]
    DeadlineExceeded,
}
