//! Unit tests for the dense bit buffer.

use crate::bits::BitBuffer;

#[test]
fn zeros_and_ones_widths() {
    let z = BitBuffer::zeros(70);
    assert_eq!(z.len(), 70);
    assert!(!z.any());
    assert_eq!(z.count_ones(), 0);

    let o = BitBuffer::ones(70);
    assert_eq!(o.len(), 70);
    assert_eq!(o.count_ones(), 70);
}

#[test]
fn ones_masks_the_tail_word() {
    // Bits past `len` stay zero, so whole-word emptiness checks are exact.
    let mut o = BitBuffer::ones(65);
    o.complement();
    assert!(!o.any());
}

#[test]
fn get_set_roundtrip() {
    let mut b = BitBuffer::zeros(130);
    b.set(0, true);
    b.set(64, true);
    b.set(129, true);

    assert!(b.get(0));
    assert!(b.get(64));
    assert!(b.get(129));
    assert!(!b.get(1));
    assert_eq!(b.count_ones(), 3);
}

#[test]
fn from_bits_reads_leftmost_first() {
    let b = BitBuffer::from_bits("1001 0000");
    assert_eq!(b.len(), 8);
    assert!(b.get(0));
    assert!(b.get(3));
    assert!(!b.get(1));
}

#[test]
fn and_or_assign() {
    let mut a = BitBuffer::from_bits("1100");
    a.and_assign(&BitBuffer::from_bits("1010"));
    assert_eq!(a, BitBuffer::from_bits("1000"));

    a.or_assign(&BitBuffer::from_bits("0001"));
    assert_eq!(a, BitBuffer::from_bits("1001"));
}

#[test]
fn complement_respects_width() {
    let mut b = BitBuffer::from_bits("101");
    b.complement();
    assert_eq!(b, BitBuffer::from_bits("010"));
    assert_eq!(b.count_ones(), 1);
}

#[test]
fn iter_ones_is_ascending() {
    let mut b = BitBuffer::zeros(200);
    for i in [199, 5, 64, 63, 0, 128] {
        b.set(i, true);
    }
    let ones: Vec<_> = b.iter_ones().collect();
    assert_eq!(ones, [0, 5, 63, 64, 128, 199]);
}

#[test]
fn iter_ones_on_empty_buffer() {
    assert_eq!(BitBuffer::zeros(77).iter_ones().count(), 0);
    assert_eq!(BitBuffer::zeros(0).iter_ones().count(), 0);
}

#[test]
#[should_panic(expected = "bit pattern")]
fn from_bits_rejects_other_characters() {
    BitBuffer::from_bits("10x1");
}

#[test]
#[should_panic(expected = "width mismatch")]
fn and_assign_rejects_width_mismatch() {
    let mut a = BitBuffer::zeros(8);
    a.and_assign(&BitBuffer::zeros(9));
}
