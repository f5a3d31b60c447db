//! Unit tests for the in-memory index.

use bitsieve_core::{RowAddress, RowHandle};

use crate::bits::BitBuffer;
use crate::index::{RamIndex, RowIndex};

fn handle(index: &mut RamIndex, term: &str, rank: u8) -> RowHandle {
    let address = index.address_of(term);
    RowHandle::new(rank, address, false).unwrap()
}

#[test]
fn row_width_shrinks_with_rank() {
    let index = RamIndex::new(64);
    assert_eq!(index.row_width(0), 64);
    assert_eq!(index.row_width(3), 8);
    assert_eq!(index.row_width(6), 1);

    // Widths round up when documents don't fill the last bit.
    let odd = RamIndex::new(65);
    assert_eq!(odd.row_width(3), 9);
}

#[test]
fn insert_and_fetch_roundtrip() {
    let mut index = RamIndex::new(8);
    index.insert_bits("cat", 0, "10100000");

    let row = handle(&mut index, "cat", 0);
    assert!(index.is_resident(&row));
    assert_eq!(index.row_bits(&row), Some(&BitBuffer::from_bits("10100000")));
    assert_eq!(index.row_count(), 1);
}

#[test]
fn missing_rows_are_not_resident() {
    let mut index = RamIndex::new(8);
    index.insert_bits("cat", 0, "10100000");

    // Same term at another rank is a different row.
    let rank_three = handle(&mut index, "cat", 3);
    assert!(!index.is_resident(&rank_three));
    assert_eq!(index.row_bits(&rank_three), None);
}

#[test]
fn address_of_deduplicates_terms() {
    let mut index = RamIndex::new(8);
    let a = index.address_of("cat");
    let b = index.address_of("cat");
    let c = index.address_of("dog");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn addresses_are_term_table_slots() {
    let mut index = RamIndex::new(8);
    let cat = index.address_of("cat");
    index.insert_bits("dog", 0, "00000001");

    // Later inserts never move an assigned slot.
    assert_eq!(index.address_of("cat"), cat);
    assert_eq!(index.term_of(cat), Some("cat"));
    assert!(index.address_of("dog") > cat);
}

#[test]
fn term_of_rejects_unassigned_slots() {
    let index = RamIndex::new(8);
    assert_eq!(index.term_of(RowAddress::from_raw(3)), None);
}

#[test]
fn insert_replaces_existing_row() {
    let mut index = RamIndex::new(8);
    index.insert_bits("cat", 0, "11111111");
    index.insert_bits("cat", 0, "00000001");

    let row = handle(&mut index, "cat", 0);
    assert_eq!(index.row_bits(&row), Some(&BitBuffer::from_bits("00000001")));
    assert_eq!(index.row_count(), 1);
}

#[test]
#[should_panic(expected = "rank 3")]
fn insert_rejects_wrong_width() {
    let mut index = RamIndex::new(64);
    // Rank 3 over 64 documents needs 8 bits, not 64.
    index.insert_bits("cat", 3, &"1".repeat(64));
}
