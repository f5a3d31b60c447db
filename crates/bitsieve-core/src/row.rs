//! Row descriptors.
//!
//! A row is a bit vector over the document columns, identified by an opaque
//! address in the term table's address space. The handle also records the
//! row's rank and whether reads from it are complemented.

use crate::{MAX_RANK, Rank, RowError};

/// A lightweight handle to a row's identity in the term table.
///
/// Comparing two addresses is O(1). An address is the row's slot in the
/// term table, assigned in first-seen order, so addresses sort by
/// assignment rather than by term text.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RowAddress(u32);

impl RowAddress {
    /// Raw index for serialization/debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create an address from a raw index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// Immutable descriptor of a single row: rank, address, inversion flag.
///
/// `inverted` flips the semantic interpretation of every bit read from the
/// row; backends honor it at read time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RowHandle {
    rank: Rank,
    address: RowAddress,
    inverted: bool,
}

impl RowHandle {
    /// Construct a handle, rejecting ranks above [`MAX_RANK`].
    pub fn new(rank: Rank, address: RowAddress, inverted: bool) -> Result<Self, RowError> {
        if rank > MAX_RANK {
            return Err(RowError::InvalidRank {
                rank,
                max: MAX_RANK,
            });
        }
        Ok(Self {
            rank,
            address,
            inverted,
        })
    }

    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    #[inline]
    pub fn address(&self) -> RowAddress {
        self.address
    }

    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

impl std::fmt::Display for RowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Row({}, {}, {})",
            self.rank,
            self.address.as_u32(),
            self.inverted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_supported_ranks() {
        for rank in 0..=MAX_RANK {
            assert!(RowHandle::new(rank, RowAddress::from_raw(0), false).is_ok());
        }
    }

    #[test]
    fn new_rejects_rank_above_max() {
        let err = RowHandle::new(MAX_RANK + 1, RowAddress::from_raw(0), false).unwrap_err();
        assert_eq!(
            err,
            RowError::InvalidRank {
                rank: MAX_RANK + 1,
                max: MAX_RANK
            }
        );
    }

    #[test]
    fn equality_is_structural() {
        let a = RowHandle::new(3, RowAddress::from_raw(7), false).unwrap();
        let b = RowHandle::new(3, RowAddress::from_raw(7), false).unwrap();
        let c = RowHandle::new(3, RowAddress::from_raw(7), true).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_matches_row_literal_form() {
        let row = RowHandle::new(2, RowAddress::from_raw(12), true).unwrap();
        assert_eq!(row.to_string(), "Row(2, 12, true)");
    }
}
