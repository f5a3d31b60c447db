//! Linear row programs.
//!
//! [`RowProgram`] implements the codegen's emitter seam by recording the
//! instruction stream with labels resolved to positions - the in-memory
//! equivalent of a bytecode writer. [`run_program`] then executes the
//! stream with the same register/stack semantics the interpreter gives the
//! tree, which is what the backend-equivalence property tests.

use std::collections::HashMap;
use std::fmt::Write as _;

use bitsieve_core::{Rank, RowHandle};
use bitsieve_plan::check::CheckedPlan;
use bitsieve_plan::codegen::{CodeEmitter, EmitError, Label};

use crate::bits::BitBuffer;
use crate::error::ExecError;
use crate::index::{MatchSink, RowIndex};
use crate::interp::{emit_matches, read_row};
use crate::policy::ExecPolicy;
use crate::trace::{ExecTracer, NoopTracer};

/// One abstract machine instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    /// Load a row slice into the working register.
    LoadRow { row: RowHandle, rank: Rank },
    /// AND a row into the working register.
    AndRow { row: RowHandle },
    /// OR a row into the working register.
    OrRow { row: RowHandle },
    /// Restore the coarser rank and intersect with the saved accumulator.
    LeftShiftOffset { delta: Rank },
    /// Save the accumulator and enter the finer rank.
    RightShiftOffset { delta: Rank },
    /// Skip to `target` when the working register is empty.
    JumpIfZero { target: Label },
    /// Push the working register.
    Push,
    /// Pop into the working register.
    Pop,
    /// Pop two operands, push their intersection.
    AndStack,
    /// Pop two operands, push their union.
    OrStack,
    /// Complement the top of stack.
    Not,
    /// Emit the working register's set columns.
    Report,
}

/// A recorded instruction stream with resolved jump targets.
#[derive(Debug, Clone, Default)]
pub struct RowProgram {
    instrs: Vec<Instr>,
    targets: HashMap<Label, usize>,
    root_rank: Rank,
}

impl RowProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the program for a checked plan.
    pub fn compile(plan: &CheckedPlan<'_>) -> Result<Self, EmitError> {
        let mut program = Self {
            root_rank: plan.root_rank(),
            ..Self::default()
        };
        bitsieve_plan::codegen::compile(plan, &mut program)?;
        Ok(program)
    }

    #[inline]
    pub fn instructions(&self) -> &[Instr] {
        &self.instrs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    #[inline]
    pub fn root_rank(&self) -> Rank {
        self.root_rank
    }

    /// Position a label resolves to, once placed.
    pub fn target_of(&self, label: Label) -> Option<usize> {
        self.targets.get(&label).copied()
    }

    /// Human-readable listing with jump targets resolved to positions.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (position, instr) in self.instrs.iter().enumerate() {
            // Writing into a String cannot fail.
            write!(out, "{position:>3}  ").unwrap();
            match instr {
                Instr::LoadRow { row, rank } => writeln!(out, "LoadRow {row} @{rank}"),
                Instr::AndRow { row } => writeln!(out, "AndRow {row}"),
                Instr::OrRow { row } => writeln!(out, "OrRow {row}"),
                Instr::LeftShiftOffset { delta } => writeln!(out, "LeftShiftOffset {delta}"),
                Instr::RightShiftOffset { delta } => writeln!(out, "RightShiftOffset {delta}"),
                Instr::JumpIfZero { target } => {
                    match self.target_of(*target) {
                        Some(position) => writeln!(out, "JumpIfZero -> {position}"),
                        None => writeln!(out, "JumpIfZero -> ?"),
                    }
                }
                Instr::Push => writeln!(out, "Push"),
                Instr::Pop => writeln!(out, "Pop"),
                Instr::AndStack => writeln!(out, "AndStack"),
                Instr::OrStack => writeln!(out, "OrStack"),
                Instr::Not => writeln!(out, "Not"),
                Instr::Report => writeln!(out, "Report"),
            }
            .unwrap();
        }
        out
    }
}

impl CodeEmitter for RowProgram {
    fn load_row(&mut self, row: RowHandle, rank: Rank) {
        self.instrs.push(Instr::LoadRow { row, rank });
    }
    fn and_row(&mut self, row: RowHandle) {
        self.instrs.push(Instr::AndRow { row });
    }
    fn or_row(&mut self, row: RowHandle) {
        self.instrs.push(Instr::OrRow { row });
    }
    fn left_shift_offset(&mut self, delta: Rank) {
        self.instrs.push(Instr::LeftShiftOffset { delta });
    }
    fn right_shift_offset(&mut self, delta: Rank) {
        self.instrs.push(Instr::RightShiftOffset { delta });
    }
    fn jump_if_zero(&mut self, label: Label) {
        self.instrs.push(Instr::JumpIfZero { target: label });
    }
    fn place_label(&mut self, label: Label) {
        self.targets.insert(label, self.instrs.len());
    }
    fn push(&mut self) {
        self.instrs.push(Instr::Push);
    }
    fn pop(&mut self) {
        self.instrs.push(Instr::Pop);
    }
    fn and_stack(&mut self) {
        self.instrs.push(Instr::AndStack);
    }
    fn or_stack(&mut self) {
        self.instrs.push(Instr::OrStack);
    }
    fn not(&mut self) {
        self.instrs.push(Instr::Not);
    }
    fn report(&mut self) {
        self.instrs.push(Instr::Report);
    }
}

/// Execute a row program against an index.
pub fn run_program<I, S>(
    program: &RowProgram,
    index: &I,
    sink: &mut S,
    policy: &ExecPolicy<'_>,
) -> Result<(), ExecError>
where
    I: RowIndex,
    S: MatchSink,
{
    run_program_traced(program, index, sink, policy, &mut NoopTracer)
}

/// Execute with a tracer observing execution events.
pub fn run_program_traced<I, S, T>(
    program: &RowProgram,
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
    let mut pc = 0usize;
    let mut rank = program.root_rank();
    let mut acc = BitBuffer::ones(documents as usize);
    let mut stack: Vec<BitBuffer> = Vec::new();

    let read = |row: &RowHandle, tracer: &mut T| -> Result<BitBuffer, ExecError> {
        let bits = read_row(index, row, documents, policy.is_strict())?;
        tracer.trace_read(row);
        Ok(bits)
    };

    while let Some(instr) = program.instrs.get(pc) {
        pc += 1;
        match instr {
            Instr::LoadRow { row, .. } => {
                acc = read(row, tracer)?;
            }
            Instr::AndRow { row } => {
                let bits = read(row, tracer)?;
                acc.and_assign(&bits);
            }
            Instr::OrRow { row } => {
                let bits = read(row, tracer)?;
                acc.or_assign(&bits);
            }
            Instr::JumpIfZero { target } => {
                if !acc.any() {
                    tracer.trace_short_circuit(rank);
                    pc = program
                        .target_of(*target)
                        .expect("jump to a label that was never placed");
                }
            }
            Instr::RightShiftOffset { delta } => {
                policy.checkpoint()?;
                stack.push(acc.clone());
                let from = rank;
                rank = from - delta;
                tracer.trace_rank(from, rank);
            }
            Instr::LeftShiftOffset { delta } => {
                let from = rank;
                rank = from + delta;
                tracer.trace_rank(from, rank);
                let coarse = stack.pop().expect("rank restore without a saved accumulator");
                acc.and_assign(&coarse);
            }
            Instr::Push => {
                stack.push(acc.clone());
            }
            Instr::Pop => {
                acc = stack.pop().expect("pop from an empty operand stack");
            }
            Instr::AndStack => {
                let top = stack.pop().expect("AndStack over an empty stack");
                stack
                    .last_mut()
                    .expect("AndStack over a single-operand stack")
                    .and_assign(&top);
            }
            Instr::OrStack => {
                let top = stack.pop().expect("OrStack over an empty stack");
                stack
                    .last_mut()
                    .expect("OrStack over a single-operand stack")
                    .or_assign(&top);
            }
            Instr::Not => {
                stack
                    .last_mut()
                    .expect("Not over an empty operand stack")
                    .complement();
            }
            Instr::Report => {
                emit_matches(&acc, policy, sink, tracer)?;
            }
        }
    }

    Ok(())
}
