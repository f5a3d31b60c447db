//! Core value types for the bitsieve retrieval engine.
//!
//! Documents are columns of a bit matrix; terms hash to rows at several
//! granularities. This crate carries the leaf types every other crate agrees
//! on: ranks, document ids, row addresses, and the immutable [`RowHandle`]
//! descriptor.

mod row;

pub use row::{RowAddress, RowHandle};

/// Row granularity: at rank `r`, one row bit covers `2^r` documents.
/// Rank 0 is the finest (one bit per document).
pub type Rank = u8;

/// Highest rank a row may carry.
pub const MAX_RANK: Rank = 6;

/// Document identifier within a shard (column index into the bit matrix).
pub type DocId = u32;

/// Errors constructing core row types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// Requested rank is outside the supported range.
    #[error("rank {rank} outside supported range 0..={max}")]
    InvalidRank { rank: Rank, max: Rank },
}
