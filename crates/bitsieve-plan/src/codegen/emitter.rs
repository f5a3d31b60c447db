//! The row-program instruction vocabulary.

use bitsieve_core::{Rank, RowHandle};

/// Jump label within an emitted program. Allocated from a monotonic counter
/// during lowering; placed exactly once.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Label(pub u32);

/// Sink for the lowered instruction stream.
///
/// The working register holds the accumulator; the operand stack carries
/// saved accumulators and rank-zero values. Implementations only record or
/// execute - all sequencing decisions are made by the lowering walk.
pub trait CodeEmitter {
    /// Load a row slice into the working register.
    fn load_row(&mut self, row: RowHandle, rank: Rank);

    /// AND a row into the working register at the current rank.
    fn and_row(&mut self, row: RowHandle);

    /// OR a row into the working register at the current rank.
    fn or_row(&mut self, row: RowHandle);

    /// Leave a refined rank: restore the coarser rank and intersect the
    /// register with the saved coarse accumulator.
    fn left_shift_offset(&mut self, delta: Rank);

    /// Enter a refined rank: save the coarse accumulator and lower the
    /// current rank by `delta`.
    fn right_shift_offset(&mut self, delta: Rank);

    /// Skip ahead to `label` when the working register is empty.
    fn jump_if_zero(&mut self, label: Label);

    /// Resolve a previously allocated label to the current position.
    fn place_label(&mut self, label: Label);

    /// Push the working register onto the operand stack.
    fn push(&mut self);

    /// Pop the operand stack into the working register.
    fn pop(&mut self);

    /// Pop two operands, push their intersection.
    fn and_stack(&mut self);

    /// Pop two operands, push their union.
    fn or_stack(&mut self);

    /// Complement the top of the operand stack.
    fn not(&mut self);

    /// Emit the working register's set columns to the match sink.
    fn report(&mut self);
}
