//! Type checking for compile plans.
//!
//! A single walk verifies, against an explicitly supplied root rank:
//! - phase containment: rank-down children of rank-down nodes, rank-zero
//!   children of rank-zero nodes, with `Report` as the only bridge;
//! - rank monotonicity: the current rank never increases along a path and
//!   never underflows zero;
//! - accumulator discipline: a subsequence is seeded by `LoadRowJz` before
//!   any `AndRowJz`, with `Or` branches and rank transitions starting fresh;
//! - `Report` uniqueness per evaluation path;
//! - row/rank agreement: Jz rows at the current rank, rank-zero rows at
//!   rank zero.
//!
//! The pass is a pure function of the IR. Success yields a [`CheckedPlan`]
//! borrow that both backends require, so neither can run unchecked input.

use bitsieve_core::Rank;

use crate::node::{CompileNode, NodePath, Phase, PlanError};

/// Proof that a plan passed [`check`] at a given root rank.
#[derive(Debug, Clone, Copy)]
pub struct CheckedPlan<'p> {
    root: &'p CompileNode,
    root_rank: Rank,
}

impl<'p> CheckedPlan<'p> {
    #[inline]
    pub fn root(&self) -> &'p CompileNode {
        self.root
    }

    #[inline]
    pub fn root_rank(&self) -> Rank {
        self.root_rank
    }
}

/// Verify a plan against the invariants above.
///
/// On failure the error names the offending node path and the rule it broke.
pub fn check(root: &CompileNode, root_rank: Rank) -> Result<CheckedPlan<'_>, PlanError> {
    let mut checker = Checker {
        path: NodePath::root(),
    };
    if root.phase() != Phase::RankDown {
        // A bare rank-zero tree has no emission point; plans enter through
        // the rank-down side.
        return Err(PlanError::PhaseMismatch {
            path: NodePath::root(),
            expected: Phase::RankDown,
            found: Phase::RankZero,
        });
    }
    checker.walk(root, root_rank, false, false)?;
    Ok(CheckedPlan { root, root_rank })
}

struct Checker {
    path: NodePath,
}

impl Checker {
    /// Walk a rank-down subtree. `seeded` tracks whether a `LoadRowJz` has
    /// run on this rank subsequence; `reported` whether a `Report` is
    /// already on the path.
    fn walk(
        &mut self,
        node: &CompileNode,
        rank: Rank,
        seeded: bool,
        reported: bool,
    ) -> Result<(), PlanError> {
        match node {
            CompileNode::AndRowJz { row, child } => {
                if !seeded {
                    return Err(PlanError::AccumulatorUnseeded {
                        path: self.path.clone(),
                    });
                }
                self.check_row(row, rank)?;
                self.walk_child_opt(child.as_deref(), rank, seeded, reported)
            }
            CompileNode::LoadRowJz { row, child } => {
                self.check_row(row, rank)?;
                self.walk_child_opt(child.as_deref(), rank, true, reported)
            }
            CompileNode::Or { left, right } => {
                // Branches are independent subsequences; each re-seeds.
                self.enter(0, |c| c.walk(left, rank, false, reported))?;
                self.enter(1, |c| c.walk(right, rank, false, reported))
            }
            CompileNode::RankDown { delta, child } => {
                let delta = delta.get();
                if delta > rank {
                    return Err(PlanError::RankUnderflow {
                        path: self.path.clone(),
                        rank,
                        delta,
                    });
                }
                self.enter(0, |c| c.walk(child, rank - delta, false, reported))
            }
            CompileNode::Report { child } => {
                if reported {
                    return Err(PlanError::DuplicateReport {
                        path: self.path.clone(),
                    });
                }
                match child.as_deref() {
                    None => Ok(()),
                    Some(child) if child.phase() == Phase::RankDown => {
                        self.enter(0, |c| c.walk(child, rank, false, true))
                    }
                    Some(child) => self.enter(0, |c| c.walk_zero(child)),
                }
            }
            CompileNode::AndTree { .. }
            | CompileNode::LoadRow { .. }
            | CompileNode::Not { .. }
            | CompileNode::OrTree { .. } => Err(PlanError::PhaseMismatch {
                path: self.path.clone(),
                expected: Phase::RankDown,
                found: Phase::RankZero,
            }),
        }
    }

    /// Walk a rank-zero subtree. Rows here read one bit per document, so
    /// they must be bound at rank zero regardless of the surrounding rank.
    fn walk_zero(&mut self, node: &CompileNode) -> Result<(), PlanError> {
        match node {
            CompileNode::AndTree { left, right } | CompileNode::OrTree { left, right } => {
                self.enter(0, |c| c.walk_zero(left))?;
                self.enter(1, |c| c.walk_zero(right))
            }
            CompileNode::LoadRow { row } => self.check_row(row, 0),
            CompileNode::Not { child } => self.enter(0, |c| c.walk_zero(child)),
            _ => Err(PlanError::PhaseMismatch {
                path: self.path.clone(),
                expected: Phase::RankZero,
                found: Phase::RankDown,
            }),
        }
    }

    fn walk_child_opt(
        &mut self,
        child: Option<&CompileNode>,
        rank: Rank,
        seeded: bool,
        reported: bool,
    ) -> Result<(), PlanError> {
        match child {
            Some(child) => self.enter(0, |c| c.walk(child, rank, seeded, reported)),
            None => Ok(()),
        }
    }

    fn check_row(&self, row: &bitsieve_core::RowHandle, expected: Rank) -> Result<(), PlanError> {
        if row.rank() != expected {
            return Err(PlanError::RowRankMismatch {
                path: self.path.clone(),
                row: *row,
                expected,
            });
        }
        Ok(())
    }

    fn enter<F>(&mut self, index: u8, f: F) -> Result<(), PlanError>
    where
        F: FnOnce(&mut Self) -> Result<(), PlanError>,
    {
        self.path.push(index);
        let result = f(self);
        self.path.pop();
        result
    }
}
