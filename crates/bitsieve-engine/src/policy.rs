//! Execution policy: residency strictness, cancellation, deadlines.

use std::time::Instant;

use crate::error::ExecError;

/// Per-evaluation execution policy.
///
/// Cancellation is cooperative: the predicate and the deadline are consulted
/// at rank transitions and between report emissions. Residency defaults to
/// non-strict, where a missing row reads as all-zero (before inversion), so
/// queries proceed while ingestion is in flight.
#[derive(Default, Clone, Copy)]
pub struct ExecPolicy<'a> {
    strict_residency: bool,
    cancel: Option<&'a dyn Fn() -> bool>,
    deadline: Option<Instant>,
}

impl<'a> ExecPolicy<'a> {
    /// Policy with defaults: non-strict, no cancel, no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort with `RowNotResident` instead of reading missing rows as zero.
    pub fn strict_residency(mut self, strict: bool) -> Self {
        self.strict_residency = strict;
        self
    }

    /// Install a cooperative cancellation predicate.
    pub fn cancel(mut self, cancel: &'a dyn Fn() -> bool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Install an evaluation deadline.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.strict_residency
    }

    /// Consult the cancel predicate and deadline.
    pub(crate) fn checkpoint(&self) -> Result<(), ExecError> {
        if let Some(cancel) = self.cancel
            && cancel()
        {
            return Err(ExecError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ExecError::DeadlineExceeded);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExecPolicy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecPolicy")
            .field("strict_residency", &self.strict_residency)
            .field("cancel", &self.cancel.is_some())
            .field("deadline", &self.deadline)
            .finish()
    }
}
