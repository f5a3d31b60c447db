//! Execution backends for compile plans.
//!
//! Two backends share one semantic:
//! - `interp` - the tree-walking reference evaluator
//! - `program` - a linear row program recorded through the codegen's
//!   emitter seam, plus the machine that runs it
//!
//! Around them sit the collaborators the plans execute against: the dense
//! [`BitBuffer`], the [`RowIndex`] and [`MatchSink`] traits with an
//! in-memory [`RamIndex`], the [`ExecPolicy`] (residency strictness,
//! cancellation, deadline), and the [`ExecTracer`] hooks.
//!
//! When the two backends disagree on a checked plan, the interpreter is
//! authoritative.

pub mod bits;
pub mod error;
pub mod index;
pub mod interp;
pub mod policy;
pub mod program;
pub mod trace;

#[cfg(test)]
mod bits_tests;
#[cfg(test)]
mod index_tests;

pub use bits::BitBuffer;
pub use error::ExecError;
pub use index::{MatchSink, RamIndex, RowIndex};
pub use interp::{evaluate, evaluate_traced};
pub use policy::ExecPolicy;
pub use program::{Instr, RowProgram, run_program, run_program_traced};
pub use trace::{ExecTracer, NoopTracer};
