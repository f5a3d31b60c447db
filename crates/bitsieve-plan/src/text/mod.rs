//! Textual persistence for compile plans.
//!
//! The format is a self-describing record form, one node per braced block:
//!
//! ```text
//! Report {
//!   child: LoadRowJz {
//!     row: Row(3, 0, false),
//!     child: null
//!   }
//! }
//! ```
//!
//! The formatter emits fields in the order fixed by each variant's
//! descriptor, and the parser demands that order back, so
//! `parse(format(plan))` is the identity and `format(parse(text))`
//! reproduces canonical text byte for byte.

mod format;
mod lexer;
mod parser;


pub use format::{format_plan, write_plan};
pub use lexer::{Span, Token, TokenKind, lex, token_text};
pub use parser::{ParseError, ParseErrorKind, Parser, parse_plan};
