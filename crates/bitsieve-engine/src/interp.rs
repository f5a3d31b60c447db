//! The tree-walking reference evaluator.
//!
//! Walks a checked plan directly, maintaining the current rank, a
//! document-width accumulator, and a small operand stack for rank-zero
//! subtrees. Reads expand a rank-`r` row to document width (`row[d >> r]`,
//! inversion applied), so rank transitions intersect rather than reshape.
//!
//! When the accumulator goes empty at a Jz node, the rest of that subtree
//! is skipped and control unwinds to the nearest enclosing `Or` merge or
//! the root - the same positions the codegen places its jump targets.
//!
//! This backend is the reference: where the row machine and this evaluator
//! disagree, this one is authoritative.

use bitsieve_core::{DocId, Rank, RowHandle};
use bitsieve_plan::check::CheckedPlan;
use bitsieve_plan::node::{CompileNode, Phase};

use crate::bits::BitBuffer;
use crate::error::ExecError;
use crate::index::{MatchSink, RowIndex};
use crate::policy::ExecPolicy;
use crate::trace::{ExecTracer, NoopTracer};

/// Evaluate a checked plan against an index, reporting matches to `sink`.
pub fn evaluate<I, S>(
    plan: &CheckedPlan<'_>,
    index: &I,
    sink: &mut S,
    policy: &ExecPolicy<'_>,
) -> Result<(), ExecError>
where
    I: RowIndex,
    S: MatchSink,
{
    evaluate_traced(plan, index, sink, policy, &mut NoopTracer)
}

/// Evaluate with a tracer observing execution events.
pub fn evaluate_traced<I, S, T>(
    plan: &CheckedPlan<'_>,
    index: &I,
    sink: &mut S,
    policy: &ExecPolicy<'_>,
    tracer: &mut T,
) -> Result<(), ExecError>
where
    I: RowIndex,
    S: MatchSink,
    T: ExecTracer,
{
    let documents = index.document_count();
    let mut evaluator = Evaluator {
        index,
        sink,
        policy,
        tracer,
        documents,
        rank: plan.root_rank(),
        acc: BitBuffer::ones(documents as usize),
        stack: Vec::new(),
    };
    evaluator.eval(plan.root())?;
    Ok(())
}

/// Read a row expanded to document width: document `d` takes the row's bit
/// `d >> rank`, then inversion applies. Under strict residency a missing
/// row aborts; otherwise it reads as all-zero before inversion. Shared with
/// the row machine so both backends read identically.
pub(crate) fn read_row<I: RowIndex>(
    index: &I,
    row: &RowHandle,
    documents: u32,
    strict: bool,
) -> Result<BitBuffer, ExecError> {
    if strict && !index.is_resident(row) {
        return Err(ExecError::RowNotResident(*row));
    }
    let bits = index.row_bits(row);

    let docs = documents as usize;
    let mut out = BitBuffer::zeros(docs);
    for doc in 0..docs {
        let bit = bits.map(|b| b.get(doc >> row.rank())).unwrap_or(false);
        if bit != row.is_inverted() {
            out.set(doc, true);
        }
    }
    Ok(out)
}

/// Emit the set columns of `acc` in ascending order, consulting the policy
/// between emissions. Shared with the row machine so both backends report
/// identically.
pub(crate) fn emit_matches<S, T>(
    acc: &BitBuffer,
    policy: &ExecPolicy<'_>,
    sink: &mut S,
    tracer: &mut T,
) -> Result<(), ExecError>
where
    S: MatchSink,
    T: ExecTracer,
{
    policy.checkpoint()?;
    for doc in acc.iter_ones() {
        policy.checkpoint()?;
        let doc = doc as DocId;
        sink.report(doc);
        tracer.trace_report(doc);
    }
    Ok(())
}

struct Evaluator<'a, I, S, T> {
    index: &'a I,
    sink: &'a mut S,
    policy: &'a ExecPolicy<'a>,
    tracer: &'a mut T,
    documents: u32,
    rank: Rank,
    acc: BitBuffer,
    stack: Vec<BitBuffer>,
}

impl<I, S, T> Evaluator<'_, I, S, T>
where
    I: RowIndex,
    S: MatchSink,
    T: ExecTracer,
{
    fn read(&mut self, row: &RowHandle) -> Result<BitBuffer, ExecError> {
        let out = read_row(self.index, row, self.documents, self.policy.is_strict())?;
        self.tracer.trace_read(row);
        Ok(out)
    }

    fn eval(&mut self, node: &CompileNode) -> Result<(), ExecError> {
        match node {
            CompileNode::LoadRowJz { row, child } => {
                self.acc = self.read(row)?;
                self.continue_unless_empty(child.as_deref())
            }
            CompileNode::AndRowJz { row, child } => {
                let bits = self.read(row)?;
                self.acc.and_assign(&bits);
                self.continue_unless_empty(child.as_deref())
            }
            CompileNode::Or { left, right } => {
                // Branches run as independent subsequences; the merge is
                // intersected with the accumulator inherited at entry.
                let entry = self.acc.clone();
                self.eval(left)?;
                let left_acc = self.acc.clone();
                self.eval(right)?;
                self.acc.or_assign(&left_acc);
                self.acc.and_assign(&entry);
                Ok(())
            }
            CompileNode::RankDown { delta, child } => {
                self.policy.checkpoint()?;
                let delta = delta.get();
                let coarse = self.acc.clone();
                let from = self.rank;

                self.rank = from - delta;
                self.tracer.trace_rank(from, self.rank);
                self.eval(child)?;
                self.tracer.trace_rank(self.rank, from);
                self.rank = from;

                // The refined accumulator stays constrained by the coarse
                // filter it descended from.
                self.acc.and_assign(&coarse);
                Ok(())
            }
            CompileNode::Report { child } => {
                match child.as_deref() {
                    None => {}
                    Some(child) if child.phase() == Phase::RankDown => {
                        self.eval(child)?;
                    }
                    Some(child) => {
                        self.eval_zero(child)?;
                        self.acc = self
                            .stack
                            .pop()
                            .expect("rank-zero subtree leaves its value on the stack");
                    }
                }
                emit_matches(&self.acc, self.policy, self.sink, self.tracer)
            }
            CompileNode::AndTree { .. }
            | CompileNode::LoadRow { .. }
            | CompileNode::Not { .. }
            | CompileNode::OrTree { .. } => {
                unreachable!("rank-zero {:?} in rank-down position", node.node_type())
            }
        }
    }

    /// Short-circuit on an empty accumulator, otherwise run the
    /// continuation. Skipping the child is the whole of the unwind: the
    /// enclosing `Or` merge or root is simply the next code to run.
    fn continue_unless_empty(&mut self, child: Option<&CompileNode>) -> Result<(), ExecError> {
        if !self.acc.any() {
            self.tracer.trace_short_circuit(self.rank);
            return Ok(());
        }
        match child {
            Some(child) => self.eval(child),
            None => Ok(()),
        }
    }

    fn eval_zero(&mut self, node: &CompileNode) -> Result<(), ExecError> {
        match node {
            CompileNode::LoadRow { row } => {
                let bits = self.read(row)?;
                self.stack.push(bits);
                Ok(())
            }
            CompileNode::AndTree { left, right } => {
                self.eval_zero(left)?;
                self.eval_zero(right)?;
                self.fold_top(|acc, top| acc.and_assign(top));
                Ok(())
            }
            CompileNode::OrTree { left, right } => {
                self.eval_zero(left)?;
                self.eval_zero(right)?;
                self.fold_top(|acc, top| acc.or_assign(top));
                Ok(())
            }
            CompileNode::Not { child } => {
                self.eval_zero(child)?;
                self.stack
                    .last_mut()
                    .expect("Not over an empty operand stack")
                    .complement();
                Ok(())
            }
            _ => unreachable!("rank-down {:?} in rank-zero position", node.node_type()),
        }
    }

    /// Pop the top operand and fold it into the new top.
    fn fold_top(&mut self, fold: impl FnOnce(&mut BitBuffer, &BitBuffer)) {
        let top = self.stack.pop().expect("binary op over an empty stack");
        let acc = self
            .stack
            .last_mut()
            .expect("binary op over a single-operand stack");
        fold(acc, &top);
    }
}
