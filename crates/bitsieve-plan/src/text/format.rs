//! Canonical plan text emission.
//!
//! Output is deterministic: two-space indentation, one field per line, and
//! field order taken from each variant's descriptor rather than from match
//! arm order, so changing the IR layout cannot silently change the
//! persisted format. The golden tests gate the exact bytes.

use std::fmt::{self, Write};

use crate::node::CompileNode;

/// Format a plan into its canonical text.
pub fn format_plan(node: &CompileNode) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    write_plan(node, &mut out).unwrap();
    out
}

/// Write a plan's canonical text into any formatter sink.
pub fn write_plan<W: Write>(node: &CompileNode, out: &mut W) -> fmt::Result {
    PlanWriter { out, indent: 0 }.write_node(node)
}

struct PlanWriter<'w, W> {
    out: &'w mut W,
    indent: usize,
}

impl<W: Write> PlanWriter<'_, W> {
    fn write_node(&mut self, node: &CompileNode) -> fmt::Result {
        let descriptor = node.node_type().descriptor();
        write!(self.out, "{} {{", descriptor.name)?;

        self.indent += 1;
        for (i, &field) in descriptor.fields.iter().enumerate() {
            if i > 0 {
                self.out.write_char(',')?;
            }
            self.newline()?;
            write!(self.out, "{field}: ")?;
            self.write_field(node, field)?;
        }
        self.indent -= 1;

        self.newline()?;
        self.out.write_char('}')
    }

    fn write_field(&mut self, node: &CompileNode, field: &str) -> fmt::Result {
        match (field, node) {
            (
                "row",
                CompileNode::AndRowJz { row, .. }
                | CompileNode::LoadRowJz { row, .. }
                | CompileNode::LoadRow { row },
            ) => write!(self.out, "{row}"),

            (
                "child",
                CompileNode::AndRowJz { child, .. }
                | CompileNode::LoadRowJz { child, .. }
                | CompileNode::Report { child },
            ) => match child {
                Some(child) => self.write_node(child),
                None => self.out.write_str("null"),
            },

            ("child", CompileNode::RankDown { child, .. } | CompileNode::Not { child }) => {
                self.write_node(child)
            }

            ("delta", CompileNode::RankDown { delta, .. }) => write!(self.out, "{delta}"),

            (
                "children",
                CompileNode::Or { left, right }
                | CompileNode::AndTree { left, right }
                | CompileNode::OrTree { left, right },
            ) => {
                self.out.write_char('[')?;
                self.indent += 1;
                self.newline()?;
                self.write_node(left)?;
                self.out.write_char(',')?;
                self.newline()?;
                self.write_node(right)?;
                self.indent -= 1;
                self.newline()?;
                self.out.write_char(']')
            }

            _ => unreachable!("descriptor field `{field}` does not belong to {node:?}"),
        }
    }

    fn newline(&mut self) -> fmt::Result {
        self.out.write_char('\n')?;
        for _ in 0..self.indent {
            self.out.write_str("  ")?;
        }
        Ok(())
    }
}
