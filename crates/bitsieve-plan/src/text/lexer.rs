//! Lexer for the plan text format.
//!
//! Produces span-based tokens without storing text - text is sliced from the
//! source only when needed. Consecutive unrecognized characters are
//! coalesced into single `Garbage` tokens so malformed input stays
//! manageable downstream.

use logos::Logos;
use std::ops::Range;

/// Byte span into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    fn from_range(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Token kinds of the plan grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[regex("[0-9]+")]
    Int,

    /// Type names, field names, and the `Row`/`true`/`false`/`null`
    /// keywords; the parser distinguishes them by text.
    #[regex("[A-Za-z][A-Za-z0-9]*")]
    Ident,

    /// Coalesced run of characters the grammar has no use for.
    Garbage,
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Tokenize source into span-based tokens, coalescing lexer errors.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(TokenKind::Garbage, Span::from_range(start..end)));
                }
                tokens.push(Token::new(kind, Span::from_range(lexer.span())));
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        Span::from_range(start..source.len()),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// Retrieve the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[token.span.start as usize..token.span.end as usize]
}
