//! Index-side collaborators: row residency and match emission.

use indexmap::IndexMap;

use bitsieve_core::{DocId, Rank, RowAddress, RowHandle};

use crate::bits::BitBuffer;

/// Read-only row storage a plan executes against.
///
/// A row at rank `r` is `ceil(document_count / 2^r)` bits wide. Residency is
/// advisory: `row_bits` returning `None` means the row cannot be served
/// (ingest in flight, evicted), and the policy decides whether that aborts.
pub trait RowIndex {
    /// Number of documents (columns) in this shard.
    fn document_count(&self) -> u32;

    /// Whether the index can serve the row right now.
    fn is_resident(&self, row: &RowHandle) -> bool;

    /// The row's bits at its own rank, or `None` when not resident.
    fn row_bits(&self, row: &RowHandle) -> Option<&BitBuffer>;
}

impl<T: RowIndex + ?Sized> RowIndex for &T {
    fn document_count(&self) -> u32 {
        (*self).document_count()
    }
    fn is_resident(&self, row: &RowHandle) -> bool {
        (*self).is_resident(row)
    }
    fn row_bits(&self, row: &RowHandle) -> Option<&BitBuffer> {
        (*self).row_bits(row)
    }
}

/// Receiver for matched document ids.
pub trait MatchSink {
    fn report(&mut self, doc: DocId);
}

impl MatchSink for Vec<DocId> {
    fn report(&mut self, doc: DocId) {
        self.push(doc);
    }
}

/// Rows held for one term, at most one per rank. Terms carry rows at a
/// handful of ranks, so a short vector beats a map here.
#[derive(Debug, Clone, Default)]
struct TermRows {
    by_rank: Vec<(Rank, BitBuffer)>,
}

impl TermRows {
    fn at(&self, rank: Rank) -> Option<&BitBuffer> {
        self.by_rank
            .iter()
            .find(|(stored, _)| *stored == rank)
            .map(|(_, bits)| bits)
    }
}

/// In-memory term table for tests and tooling.
///
/// Terms occupy slots in first-seen order, and a term's slot index is its
/// row address, so the integer addresses in plan text resolve here without
/// a separate mapping. Each slot holds that term's rows by rank.
#[derive(Debug, Clone, Default)]
pub struct RamIndex {
    documents: u32,
    terms: IndexMap<String, TermRows>,
}

impl RamIndex {
    pub fn new(documents: u32) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Address of `term`, taking the next free slot on first sight. The
    /// same term always resolves to the same address.
    pub fn address_of(&mut self, term: &str) -> RowAddress {
        let entry = self.terms.entry(term.to_owned());
        let address = RowAddress::from_raw(entry.index() as u32);
        entry.or_default();
        address
    }

    /// Term occupying `address`, for tooling and error reports.
    pub fn term_of(&self, address: RowAddress) -> Option<&str> {
        self.terms
            .get_index(address.as_u32() as usize)
            .map(|(term, _)| term.as_str())
    }

    /// Store a row for `term` at `rank`, replacing any previous one.
    ///
    /// # Panics
    /// Panics when the buffer width does not match the rank's row width.
    pub fn insert_row(&mut self, term: &str, rank: Rank, bits: BitBuffer) -> RowAddress {
        assert_eq!(
            bits.len(),
            self.row_width(rank),
            "row for `{term}` at rank {rank}"
        );
        let entry = self.terms.entry(term.to_owned());
        let address = RowAddress::from_raw(entry.index() as u32);
        let rows = entry.or_default();
        match rows.by_rank.iter_mut().find(|(stored, _)| *stored == rank) {
            Some((_, existing)) => *existing = bits,
            None => rows.by_rank.push((rank, bits)),
        }
        address
    }

    /// Store a row from a `0`/`1` pattern, leftmost bit covering the lowest
    /// documents.
    pub fn insert_bits(&mut self, term: &str, rank: Rank, pattern: &str) -> RowAddress {
        self.insert_row(term, rank, BitBuffer::from_bits(pattern))
    }

    /// Bits a row at `rank` spans over this shard.
    pub fn row_width(&self, rank: Rank) -> usize {
        (self.documents as usize).div_ceil(1 << rank)
    }

    /// Number of stored rows across all terms and ranks.
    pub fn row_count(&self) -> usize {
        self.terms.values().map(|rows| rows.by_rank.len()).sum()
    }

    fn lookup(&self, row: &RowHandle) -> Option<&BitBuffer> {
        let (_, rows) = self.terms.get_index(row.address().as_u32() as usize)?;
        rows.at(row.rank())
    }
}

impl RowIndex for RamIndex {
    fn document_count(&self) -> u32 {
        self.documents
    }

    fn is_resident(&self, row: &RowHandle) -> bool {
        self.lookup(row).is_some()
    }

    fn row_bits(&self, row: &RowHandle) -> Option<&BitBuffer> {
        self.lookup(row)
    }
}
