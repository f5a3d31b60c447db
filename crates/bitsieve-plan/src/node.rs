//! The compile-plan IR.
//!
//! A plan is a strict tree over nine node variants, split into two phases.
//! RankDown nodes operate vectorially on whole rows at the current rank,
//! combining into an implicit accumulator and short-circuiting when it goes
//! empty. RankZero nodes produce per-document bits composed on a small
//! operand stack; they occur only beneath `Report`.
//!
//! Children are owned by value; a plan has no sharing and no cycles. The
//! only nullable edges are `Report`'s child and the continuation of the two
//! `*Jz` variants.

use std::num::NonZeroU8;

use bitsieve_core::{Rank, RowHandle};

/// Number of legal node types. Tags are consecutive from zero, so this is
/// also one past the highest tag.
pub const TYPE_COUNT: usize = 9;

/// Reserved tag for a serialized null edge. Never carried by a legal node.
pub const NULL_TAG: i8 = -1;

/// Reserved tag for an invalid node. Never carried by a legal node.
pub const INVALID_TAG: i8 = -2;

/// Evaluation phase of a node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Vectorized row operations against the accumulator.
    RankDown,
    /// Per-document bit operations on the operand stack.
    RankZero,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::RankDown => write!(f, "rank-down"),
            Phase::RankZero => write!(f, "rank-zero"),
        }
    }
}

/// Node type with its persisted tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum NodeType {
    // RankDown operations.
    AndRowJz = 0,
    LoadRowJz = 1,
    Or = 2,
    RankDown = 3,
    Report = 4,

    // RankZero operations.
    AndTree = 5,
    LoadRow = 6,
    Not = 7,
    OrTree = 8,
}

/// Ordered serialization schema for one node variant.
///
/// The formatter iterates `fields` in order and the parser demands the same
/// order, so the persisted layout is owned here rather than by struct
/// declaration order.
#[derive(Debug, Clone, Copy)]
pub struct VariantDescriptor {
    pub name: &'static str,
    pub tag: i8,
    pub fields: &'static [&'static str],
}

static VARIANTS: [VariantDescriptor; TYPE_COUNT] = [
    VariantDescriptor {
        name: "AndRowJz",
        tag: 0,
        fields: &["row", "child"],
    },
    VariantDescriptor {
        name: "LoadRowJz",
        tag: 1,
        fields: &["row", "child"],
    },
    VariantDescriptor {
        name: "Or",
        tag: 2,
        fields: &["children"],
    },
    VariantDescriptor {
        name: "RankDown",
        tag: 3,
        fields: &["delta", "child"],
    },
    VariantDescriptor {
        name: "Report",
        tag: 4,
        fields: &["child"],
    },
    VariantDescriptor {
        name: "AndTree",
        tag: 5,
        fields: &["children"],
    },
    VariantDescriptor {
        name: "LoadRow",
        tag: 6,
        fields: &["row"],
    },
    VariantDescriptor {
        name: "Not",
        tag: 7,
        fields: &["child"],
    },
    VariantDescriptor {
        name: "OrTree",
        tag: 8,
        fields: &["children"],
    },
];

impl NodeType {
    /// Persisted integer tag.
    #[inline]
    pub fn tag(self) -> i8 {
        self as i8
    }

    /// Canonical type name as persisted in plan text.
    #[inline]
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Serialization schema for this variant.
    #[inline]
    pub fn descriptor(self) -> &'static VariantDescriptor {
        &VARIANTS[self as usize]
    }

    /// Phase this variant belongs to.
    pub fn phase(self) -> Phase {
        match self {
            NodeType::AndRowJz
            | NodeType::LoadRowJz
            | NodeType::Or
            | NodeType::RankDown
            | NodeType::Report => Phase::RankDown,
            NodeType::AndTree | NodeType::LoadRow | NodeType::Not | NodeType::OrTree => {
                Phase::RankZero
            }
        }
    }

    /// Look up a type by its canonical name.
    pub fn from_name(name: &str) -> Option<NodeType> {
        VARIANTS
            .iter()
            .position(|v| v.name == name)
            .and_then(|tag| Self::from_tag(tag as i8))
    }

    /// Look up a type by its persisted tag. The reserved sentinels and any
    /// out-of-range value yield `None`.
    pub fn from_tag(tag: i8) -> Option<NodeType> {
        match tag {
            0 => Some(NodeType::AndRowJz),
            1 => Some(NodeType::LoadRowJz),
            2 => Some(NodeType::Or),
            3 => Some(NodeType::RankDown),
            4 => Some(NodeType::Report),
            5 => Some(NodeType::AndTree),
            6 => Some(NodeType::LoadRow),
            7 => Some(NodeType::Not),
            8 => Some(NodeType::OrTree),
            _ => None,
        }
    }
}

/// Path from the plan root to a node, as child indices. Used to pinpoint the
/// offending node in validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(Vec<u8>);

impl NodePath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend the path by one child index.
    pub fn child(&self, index: u8) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    pub fn segments(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn push(&mut self, index: u8) {
        self.0.push(index);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "root")?;
        for segment in &self.0 {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Construction and validation errors for plans.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A node of one phase appeared where the other phase is required.
    #[error("{found} node in {expected} position at {path}")]
    PhaseMismatch {
        path: NodePath,
        expected: Phase,
        found: Phase,
    },

    /// A `RankDown` would lower the current rank below zero.
    #[error("rank down by {delta} underflows current rank {rank} at {path}")]
    RankUnderflow {
        path: NodePath,
        rank: Rank,
        delta: Rank,
    },

    /// An `AndRowJz` ran before any `LoadRowJz` seeded the accumulator.
    #[error("AndRowJz before the accumulator was seeded at {path}")]
    AccumulatorUnseeded { path: NodePath },

    /// A second `Report` on the same evaluation path.
    #[error("duplicate Report on one evaluation path at {path}")]
    DuplicateReport { path: NodePath },

    /// A row bound at a rank other than the one its position demands.
    #[error("row {row} bound where rank {expected} is required at {path}")]
    RowRankMismatch {
        path: NodePath,
        row: RowHandle,
        expected: Rank,
    },
}

/// A compile-plan node. See the module docs for the phase rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileNode {
    /// AND a row into the accumulator, short-circuiting when it goes empty.
    AndRowJz {
        row: RowHandle,
        child: Option<Box<CompileNode>>,
    },
    /// Seed the accumulator from a row, short-circuiting when empty.
    LoadRowJz {
        row: RowHandle,
        child: Option<Box<CompileNode>>,
    },
    /// Merge two independent accumulator subsequences.
    Or {
        left: Box<CompileNode>,
        right: Box<CompileNode>,
    },
    /// Lower the current rank by `delta` for the child subtree.
    RankDown {
        delta: NonZeroU8,
        child: Box<CompileNode>,
    },
    /// Emit the matching columns. A null child reports the current
    /// accumulator.
    Report { child: Option<Box<CompileNode>> },
    /// Per-document AND of two rank-zero subtrees.
    AndTree {
        left: Box<CompileNode>,
        right: Box<CompileNode>,
    },
    /// Fetch one bit per document from a rank-zero row.
    LoadRow { row: RowHandle },
    /// Complement a rank-zero subtree.
    Not { child: Box<CompileNode> },
    /// Per-document OR of two rank-zero subtrees.
    OrTree {
        left: Box<CompileNode>,
        right: Box<CompileNode>,
    },
}

fn expect_phase(node: &CompileNode, expected: Phase) -> Result<(), PlanError> {
    let found = node.phase();
    if found != expected {
        return Err(PlanError::PhaseMismatch {
            path: NodePath::root(),
            expected,
            found,
        });
    }
    Ok(())
}

fn expect_phase_opt(node: Option<&CompileNode>, expected: Phase) -> Result<(), PlanError> {
    match node {
        Some(node) => expect_phase(node, expected),
        None => Ok(()),
    }
}

impl CompileNode {
    /// `AndRowJz(row, child?)`. The continuation, if present, must be a
    /// rank-down node.
    pub fn and_row_jz(row: RowHandle, child: Option<CompileNode>) -> Result<Self, PlanError> {
        expect_phase_opt(child.as_ref(), Phase::RankDown)?;
        Ok(CompileNode::AndRowJz {
            row,
            child: child.map(Box::new),
        })
    }

    /// `LoadRowJz(row, child?)`. The continuation, if present, must be a
    /// rank-down node.
    pub fn load_row_jz(row: RowHandle, child: Option<CompileNode>) -> Result<Self, PlanError> {
        expect_phase_opt(child.as_ref(), Phase::RankDown)?;
        Ok(CompileNode::LoadRowJz {
            row,
            child: child.map(Box::new),
        })
    }

    /// `Or(left, right)` over two rank-down subsequences.
    pub fn or(left: CompileNode, right: CompileNode) -> Result<Self, PlanError> {
        expect_phase(&left, Phase::RankDown)?;
        expect_phase(&right, Phase::RankDown)?;
        Ok(CompileNode::Or {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `RankDown(delta, child)`. The delta is strictly positive by type.
    pub fn rank_down(delta: NonZeroU8, child: CompileNode) -> Result<Self, PlanError> {
        expect_phase(&child, Phase::RankDown)?;
        Ok(CompileNode::RankDown {
            delta,
            child: Box::new(child),
        })
    }

    /// `Report(child?)`. The child may belong to either phase; a rank-down
    /// child is evaluated for its accumulator side effects, a rank-zero child
    /// for its stack value.
    pub fn report(child: Option<CompileNode>) -> Self {
        CompileNode::Report {
            child: child.map(Box::new),
        }
    }

    /// `AndTree(left, right)` over two rank-zero subtrees.
    pub fn and_tree(left: CompileNode, right: CompileNode) -> Result<Self, PlanError> {
        expect_phase(&left, Phase::RankZero)?;
        expect_phase(&right, Phase::RankZero)?;
        Ok(CompileNode::AndTree {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `LoadRow(row)`, a rank-zero leaf.
    pub fn load_row(row: RowHandle) -> Self {
        CompileNode::LoadRow { row }
    }

    /// `Not(child)` over a rank-zero subtree.
    pub fn not(child: CompileNode) -> Result<Self, PlanError> {
        expect_phase(&child, Phase::RankZero)?;
        Ok(CompileNode::Not {
            child: Box::new(child),
        })
    }

    /// `OrTree(left, right)` over two rank-zero subtrees.
    pub fn or_tree(left: CompileNode, right: CompileNode) -> Result<Self, PlanError> {
        expect_phase(&left, Phase::RankZero)?;
        expect_phase(&right, Phase::RankZero)?;
        Ok(CompileNode::OrTree {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// This node's type.
    pub fn node_type(&self) -> NodeType {
        match self {
            CompileNode::AndRowJz { .. } => NodeType::AndRowJz,
            CompileNode::LoadRowJz { .. } => NodeType::LoadRowJz,
            CompileNode::Or { .. } => NodeType::Or,
            CompileNode::RankDown { .. } => NodeType::RankDown,
            CompileNode::Report { .. } => NodeType::Report,
            CompileNode::AndTree { .. } => NodeType::AndTree,
            CompileNode::LoadRow { .. } => NodeType::LoadRow,
            CompileNode::Not { .. } => NodeType::Not,
            CompileNode::OrTree { .. } => NodeType::OrTree,
        }
    }

    /// Phase of this node's type.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.node_type().phase()
    }
}
