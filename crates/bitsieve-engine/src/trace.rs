//! Execution tracing hooks.
//!
//! Both backends accept a tracer; the default [`NoopTracer`] has empty
//! methods that compile away entirely, so tracing costs nothing unless a
//! real implementation is plugged in.

use bitsieve_core::{DocId, Rank, RowHandle};

/// Observer for backend execution events.
#[allow(unused_variables)]
pub trait ExecTracer {
    /// A row's bits were read (after residency resolution).
    fn trace_read(&mut self, row: &RowHandle) {}

    /// The accumulator went empty and the current subtree was skipped.
    fn trace_short_circuit(&mut self, rank: Rank) {}

    /// The current rank changed.
    fn trace_rank(&mut self, from: Rank, to: Rank) {}

    /// A matching document was emitted.
    fn trace_report(&mut self, doc: DocId) {}
}

/// Tracer that observes nothing.
pub struct NoopTracer;

impl ExecTracer for NoopTracer {}
