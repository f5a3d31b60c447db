//! Lowering from the plan IR to the instruction vocabulary.
//!
//! Left children emit before right children. Each short-circuit jump
//! targets the position just past its own node's subtree, so every
//! rank-entry/rank-exit pair stays balanced across a skip. Labels come from
//! a monotonic counter.
//!
//! Lowering assumes a checked plan; a phase violation found here is an
//! implementation bug and aborts with
//! [`EmitError::InternalEmitFailure`] carrying the offending node path.

use bitsieve_core::Rank;

use crate::check::CheckedPlan;
use crate::node::{CompileNode, NodePath, Phase};

use super::emitter::{CodeEmitter, Label};

/// Failures during emission.
///
/// The type check runs before lowering, so any of these escaping is an
/// implementation bug; callers treat it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// A node turned up on the wrong side of the phase split after the
    /// type check had accepted the plan.
    #[error("internal emit failure at {0}")]
    InternalEmitFailure(NodePath),
}

/// Emit the instruction stream for a checked plan.
pub fn compile<E: CodeEmitter>(plan: &CheckedPlan<'_>, emitter: &mut E) -> Result<(), EmitError> {
    let mut codegen = Codegen {
        emitter,
        next_label: 0,
        rank: plan.root_rank(),
        path: NodePath::root(),
    };
    codegen.lower(plan.root())
}

struct Codegen<'e, E> {
    emitter: &'e mut E,
    next_label: u32,
    rank: Rank,
    path: NodePath,
}

impl<E: CodeEmitter> Codegen<'_, E> {
    fn fresh_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn lower(&mut self, node: &CompileNode) -> Result<(), EmitError> {
        match node {
            CompileNode::AndRowJz { row, child } => {
                let end = self.fresh_label();
                self.emitter.and_row(*row);
                self.emitter.jump_if_zero(end);
                if let Some(child) = child {
                    self.enter(0, |c| c.lower(child))?;
                }
                self.emitter.place_label(end);
                Ok(())
            }
            CompileNode::LoadRowJz { row, child } => {
                let end = self.fresh_label();
                self.emitter.load_row(*row, self.rank);
                self.emitter.jump_if_zero(end);
                if let Some(child) = child {
                    self.enter(0, |c| c.lower(child))?;
                }
                self.emitter.place_label(end);
                Ok(())
            }
            CompileNode::Or { left, right } => {
                // Save the accumulator inherited at entry, evaluate both
                // branches, then merge and intersect with the entry value.
                self.emitter.push();
                self.enter(0, |c| c.lower(left))?;
                self.emitter.push();
                self.enter(1, |c| c.lower(right))?;
                self.emitter.push();
                self.emitter.or_stack();
                self.emitter.and_stack();
                self.emitter.pop();
                Ok(())
            }
            CompileNode::RankDown { delta, child } => {
                let delta = delta.get();
                self.emitter.right_shift_offset(delta);
                self.rank -= delta;
                self.enter(0, |c| c.lower(child))?;
                self.rank += delta;
                self.emitter.left_shift_offset(delta);
                Ok(())
            }
            CompileNode::Report { child } => {
                match child.as_deref() {
                    None => {}
                    Some(child) if child.phase() == Phase::RankDown => {
                        self.enter(0, |c| c.lower(child))?;
                    }
                    Some(child) => {
                        // A rank-zero subtree leaves its value on the
                        // operand stack; move it into the register.
                        self.enter(0, |c| c.lower_zero(child))?;
                        self.emitter.pop();
                    }
                }
                self.emitter.report();
                Ok(())
            }
            CompileNode::AndTree { .. }
            | CompileNode::LoadRow { .. }
            | CompileNode::Not { .. }
            | CompileNode::OrTree { .. } => {
                Err(EmitError::InternalEmitFailure(self.path.clone()))
            }
        }
    }

    fn lower_zero(&mut self, node: &CompileNode) -> Result<(), EmitError> {
        match node {
            CompileNode::LoadRow { row } => {
                self.emitter.load_row(*row, 0);
                self.emitter.push();
                Ok(())
            }
            CompileNode::AndTree { left, right } => {
                self.enter(0, |c| c.lower_zero(left))?;
                self.enter(1, |c| c.lower_zero(right))?;
                self.emitter.and_stack();
                Ok(())
            }
            CompileNode::OrTree { left, right } => {
                self.enter(0, |c| c.lower_zero(left))?;
                self.enter(1, |c| c.lower_zero(right))?;
                self.emitter.or_stack();
                Ok(())
            }
            CompileNode::Not { child } => {
                self.enter(0, |c| c.lower_zero(child))?;
                self.emitter.not();
                Ok(())
            }
            _ => Err(EmitError::InternalEmitFailure(self.path.clone())),
        }
    }

    fn enter<F>(&mut self, index: u8, f: F) -> Result<(), EmitError>
    where
        F: FnOnce(&mut Self) -> Result<(), EmitError>,
    {
        self.path.push(index);
        let result = f(self);
        self.path.pop();
        result
    }
}
