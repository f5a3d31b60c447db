//! Code-generator backend.
//!
//! Lowers a checked plan to an ordered stream of abstract row-program
//! instructions. The stream's consumer is behind the [`CodeEmitter`] trait:
//! a native-code generator, a bytecode writer, or the in-memory row program
//! in `bitsieve-engine`.

mod compile;
mod emitter;


pub use compile::{EmitError, compile};
pub use emitter::{CodeEmitter, Label};
