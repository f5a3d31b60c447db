//! Recursive-descent parser for plan text.
//!
//! Consumes an injected token slice (see [`lex`]) and builds the IR
//! bottom-up through the `CompileNode` constructors, so parsed plans carry
//! the same local well-formedness guarantees as hand-built ones. The parser
//! holds no state beyond its cursor and performs no I/O.

use std::num::NonZeroU8;

use bitsieve_core::RowHandle;

use crate::node::{CompileNode, NodeType, PlanError};

use super::lexer::{Span, Token, TokenKind, lex, token_text};

/// Parse failure kinds. Each error carries the source span it points at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unknown node type `{0}`")]
    UnknownType(String),

    #[error("missing field `{field}` on {node}")]
    MissingField {
        node: &'static str,
        field: &'static str,
    },

    #[error("`children` holds {found} nodes, expected exactly 2")]
    ArityMismatch { found: usize },

    #[error("malformed row literal")]
    MalformedRow,

    #[error("input continues after the plan")]
    TrailingGarbage,

    #[error("expected {expected}")]
    UnexpectedToken { expected: &'static str },

    #[error("{0}")]
    InvalidValue(String),
}

/// A parse error with its source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Parse a complete plan from source text.
pub fn parse_plan(source: &str) -> Result<CompileNode, ParseError> {
    let tokens = lex(source);
    Parser::new(source, &tokens).parse()
}

/// Token-stream parser. Construct over pre-lexed tokens to re-use a scanner.
pub struct Parser<'s> {
    source: &'s str,
    tokens: &'s [Token],
    pos: usize,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, tokens: &'s [Token]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    /// Parse one plan and require the input to end there.
    pub fn parse(mut self) -> Result<CompileNode, ParseError> {
        let node = self.parse_node()?;
        if let Some(token) = self.peek() {
            return Err(ParseError::new(ParseErrorKind::TrailingGarbage, token.span));
        }
        Ok(node)
    }

    fn parse_node(&mut self) -> Result<CompileNode, ParseError> {
        let name_token = self.expect(TokenKind::Ident, "node type name")?;
        let name = token_text(self.source, &name_token);
        let node_type = NodeType::from_name(name).ok_or_else(|| {
            ParseError::new(ParseErrorKind::UnknownType(name.to_owned()), name_token.span)
        })?;

        self.expect(TokenKind::LBrace, "'{'")?;
        let node = self.parse_body(node_type, name_token.span)?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(node)
    }

    /// Parse the field list of one node. Fields arrive in the variant's
    /// declared order; anything else is rejected.
    fn parse_body(&mut self, node_type: NodeType, span: Span) -> Result<CompileNode, ParseError> {
        let name = node_type.name();
        match node_type {
            NodeType::AndRowJz => {
                let row = self.parse_row_field(name)?;
                self.expect(TokenKind::Comma, "','")?;
                let child = self.parse_child_field(name)?;
                self.build(CompileNode::and_row_jz(row, child), span)
            }
            NodeType::LoadRowJz => {
                let row = self.parse_row_field(name)?;
                self.expect(TokenKind::Comma, "','")?;
                let child = self.parse_child_field(name)?;
                self.build(CompileNode::load_row_jz(row, child), span)
            }
            NodeType::Or => {
                let (left, right) = self.parse_children_field(name)?;
                self.build(CompileNode::or(left, right), span)
            }
            NodeType::RankDown => {
                let delta = self.parse_delta_field(name)?;
                self.expect(TokenKind::Comma, "','")?;
                self.expect_field(name, "child")?;
                let child = self.parse_node()?;
                self.build(CompileNode::rank_down(delta, child), span)
            }
            NodeType::Report => {
                let child = self.parse_child_field(name)?;
                Ok(CompileNode::report(child))
            }
            NodeType::AndTree => {
                let (left, right) = self.parse_children_field(name)?;
                self.build(CompileNode::and_tree(left, right), span)
            }
            NodeType::LoadRow => {
                let row = self.parse_row_field(name)?;
                Ok(CompileNode::load_row(row))
            }
            NodeType::Not => {
                self.expect_field(name, "child")?;
                let child = self.parse_node()?;
                self.build(CompileNode::not(child), span)
            }
            NodeType::OrTree => {
                let (left, right) = self.parse_children_field(name)?;
                self.build(CompileNode::or_tree(left, right), span)
            }
        }
    }

    /// Surface a constructor rejection (wrong-phase child) at the node's
    /// type name.
    fn build(
        &self,
        result: Result<CompileNode, PlanError>,
        span: Span,
    ) -> Result<CompileNode, ParseError> {
        result.map_err(|e| ParseError::new(ParseErrorKind::InvalidValue(e.to_string()), span))
    }

    fn parse_row_field(&mut self, node: &'static str) -> Result<RowHandle, ParseError> {
        self.expect_field(node, "row")?;
        self.parse_row()
    }

    fn parse_child_field(
        &mut self,
        node: &'static str,
    ) -> Result<Option<CompileNode>, ParseError> {
        self.expect_field(node, "child")?;
        if self.at_keyword("null") {
            self.pos += 1;
            return Ok(None);
        }
        Ok(Some(self.parse_node()?))
    }

    fn parse_children_field(
        &mut self,
        node: &'static str,
    ) -> Result<(CompileNode, CompileNode), ParseError> {
        self.expect_field(node, "children")?;
        let open = self.expect(TokenKind::LBracket, "'['")?;

        let mut children = Vec::new();
        if !self.at(TokenKind::RBracket) {
            children.push(self.parse_node()?);
            while self.at(TokenKind::Comma) {
                self.pos += 1;
                children.push(self.parse_node()?);
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;

        if children.len() != 2 {
            return Err(ParseError::new(
                ParseErrorKind::ArityMismatch {
                    found: children.len(),
                },
                open.span,
            ));
        }
        let mut drain = children.into_iter();
        let left = drain.next().unwrap();
        let right = drain.next().unwrap();
        Ok((left, right))
    }

    fn parse_delta_field(&mut self, node: &'static str) -> Result<NonZeroU8, ParseError> {
        self.expect_field(node, "delta")?;
        let token = self.expect(TokenKind::Int, "rank delta")?;
        let text = token_text(self.source, &token);
        let value: u8 = text.parse().map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidValue(format!("rank delta `{text}` out of range")),
                token.span,
            )
        })?;
        NonZeroU8::new(value).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::InvalidValue("rank delta must be at least 1".to_owned()),
                token.span,
            )
        })
    }

    /// `Row(rank, address, inverted)`. Every defect inside the literal is a
    /// `MalformedRow` pointing at the offending token.
    fn parse_row(&mut self) -> Result<RowHandle, ParseError> {
        let head = self.expect(TokenKind::Ident, "row literal")?;
        if token_text(self.source, &head) != "Row" {
            return Err(ParseError::new(ParseErrorKind::MalformedRow, head.span));
        }
        self.expect_row(TokenKind::LParen)?;

        let rank_token = self.expect_row(TokenKind::Int)?;
        let rank: u8 = token_text(self.source, &rank_token)
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::MalformedRow, rank_token.span))?;
        self.expect_row(TokenKind::Comma)?;

        let address_token = self.expect_row(TokenKind::Int)?;
        let address: u32 = token_text(self.source, &address_token)
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::MalformedRow, address_token.span))?;
        self.expect_row(TokenKind::Comma)?;

        let flag_token = self.expect_row(TokenKind::Ident)?;
        let inverted = match token_text(self.source, &flag_token) {
            "true" => true,
            "false" => false,
            _ => return Err(ParseError::new(ParseErrorKind::MalformedRow, flag_token.span)),
        };
        self.expect_row(TokenKind::RParen)?;

        RowHandle::new(rank, bitsieve_core::RowAddress::from_raw(address), inverted)
            .map_err(|_| ParseError::new(ParseErrorKind::MalformedRow, rank_token.span))
    }

    /// Expect a field label `name:`, reporting `MissingField` otherwise.
    fn expect_field(
        &mut self,
        node: &'static str,
        field: &'static str,
    ) -> Result<(), ParseError> {
        let span = self.next_span();
        let missing = ParseError::new(ParseErrorKind::MissingField { node, field }, span);

        let Some(token) = self.peek() else {
            return Err(missing);
        };
        if token.kind != TokenKind::Ident || token_text(self.source, token) != field {
            return Err(missing);
        }
        self.pos += 1;
        self.expect(TokenKind::Colon, "':'")?;
        Ok(())
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Ident && token_text(self.source, t) == keyword)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(&token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken { expected },
                self.next_span(),
            )),
        }
    }

    /// Like [`expect`], but inside a row literal every mismatch reads as a
    /// malformed row.
    fn expect_row(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.peek() {
            Some(&token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(ParseError::new(
                ParseErrorKind::MalformedRow,
                self.next_span(),
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Span of the next token, or a zero-width span at end of input.
    fn next_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => {
                let end = self.source.len() as u32;
                Span::new(end, end)
            }
        }
    }
}
