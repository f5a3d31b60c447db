//! Compile-plan intermediate representation and its tooling.
//!
//! A compile plan is a small tree of row-level primitive operations lowered
//! from a boolean query. This crate provides the compilation side of the
//! pipeline:
//! - `node` - the nine-variant plan IR and its constructors
//! - `check` - the type-checking pass over phase, rank, and accumulator rules
//! - `text` - the canonical textual round-trip (lexer, parser, formatter)
//! - `codegen` - lowering of checked plans to the row-program vocabulary
//!
//! Execution backends live in `bitsieve-engine`; this crate never touches an
//! index.

pub mod check;
pub mod codegen;
pub mod node;
pub mod text;

#[cfg(test)]
mod check_tests;

pub use check::{CheckedPlan, check};
pub use codegen::{CodeEmitter, EmitError, Label, compile};
pub use node::{CompileNode, NodePath, NodeType, Phase, PlanError, TYPE_COUNT, VariantDescriptor};
pub use text::{ParseError, ParseErrorKind, format_plan, parse_plan};
