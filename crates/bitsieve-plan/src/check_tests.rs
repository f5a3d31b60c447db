//! Unit tests for the type-checking pass.

use std::num::NonZeroU8;

use bitsieve_core::{RowAddress, RowHandle};

use crate::check::check;
use crate::node::{CompileNode, PlanError};

fn row(rank: u8, address: u32) -> RowHandle {
    RowHandle::new(rank, RowAddress::from_raw(address), false).unwrap()
}

fn delta(value: u8) -> NonZeroU8 {
    NonZeroU8::new(value).unwrap()
}

fn load(rank: u8, address: u32, child: Option<CompileNode>) -> CompileNode {
    CompileNode::load_row_jz(row(rank, address), child).unwrap()
}

fn and(rank: u8, address: u32, child: Option<CompileNode>) -> CompileNode {
    CompileNode::and_row_jz(row(rank, address), child).unwrap()
}

#[test]
fn single_term_plan_checks() {
    let plan = CompileNode::report(Some(load(3, 0, None)));
    let checked = check(&plan, 3).unwrap();
    assert_eq!(checked.root_rank(), 3);
    assert!(std::ptr::eq(checked.root(), &plan));
}

#[test]
fn and_chain_checks() {
    let plan = CompileNode::report(Some(load(3, 0, Some(and(3, 1, None)))));
    assert!(check(&plan, 3).is_ok());
}

#[test]
fn report_null_checks_at_any_rank() {
    let plan = CompileNode::report(None);
    assert!(check(&plan, 0).is_ok());
    assert!(check(&plan, 3).is_ok());
}

#[test]
fn rank_down_refinement_checks() {
    let inner = load(0, 0, None);
    let plan = CompileNode::report(Some(load(
        3,
        0,
        Some(CompileNode::rank_down(delta(3), inner).unwrap()),
    )));
    assert!(check(&plan, 3).is_ok());
}

#[test]
fn and_before_seed_is_rejected() {
    let plan = CompileNode::report(Some(and(3, 0, None)));
    let err = check(&plan, 3).unwrap_err();
    let PlanError::AccumulatorUnseeded { path } = err else {
        panic!("expected AccumulatorUnseeded, got {err:?}");
    };
    assert_eq!(path.segments(), [0]);
}

#[test]
fn and_directly_under_or_is_rejected() {
    let plan = CompileNode::report(Some(
        CompileNode::or(load(3, 0, None), and(3, 1, None)).unwrap(),
    ));
    let err = check(&plan, 3).unwrap_err();
    let PlanError::AccumulatorUnseeded { path } = err else {
        panic!("expected AccumulatorUnseeded, got {err:?}");
    };
    // Report -> Or -> right branch.
    assert_eq!(path.segments(), [0, 1]);
}

#[test]
fn seed_does_not_cross_rank_transitions() {
    // The accumulator must be re-seeded at the finer rank.
    let inner = CompileNode::rank_down(delta(3), and(0, 0, None)).unwrap();
    let plan = CompileNode::report(Some(load(3, 0, Some(inner))));
    assert!(matches!(
        check(&plan, 3),
        Err(PlanError::AccumulatorUnseeded { .. })
    ));
}

#[test]
fn rank_underflow_is_rejected() {
    let inner = CompileNode::rank_down(delta(4), load(0, 0, None)).unwrap();
    let plan = CompileNode::report(Some(load(3, 0, Some(inner))));
    let err = check(&plan, 3).unwrap_err();
    assert!(matches!(
        err,
        PlanError::RankUnderflow { rank: 3, delta: 4, .. }
    ));
}

#[test]
fn duplicate_report_on_one_path_is_rejected() {
    let inner = CompileNode::report(None);
    let plan = CompileNode::report(Some(load(3, 0, Some(inner))));
    let err = check(&plan, 3).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateReport { .. }));
}

#[test]
fn report_per_or_branch_is_allowed() {
    // Branches are distinct evaluation paths; one Report each is legal.
    let left = load(3, 0, Some(CompileNode::report(None)));
    let right = load(3, 1, Some(CompileNode::report(None)));
    let plan = CompileNode::or(left, right).unwrap();
    assert!(check(&plan, 3).is_ok());
}

#[test]
fn jz_row_must_match_current_rank() {
    let plan = CompileNode::report(Some(load(2, 0, None)));
    let err = check(&plan, 3).unwrap_err();
    assert!(matches!(
        err,
        PlanError::RowRankMismatch { expected: 3, .. }
    ));
}

#[test]
fn rank_zero_rows_must_be_rank_zero() {
    let tree = CompileNode::and_tree(
        CompileNode::load_row(row(1, 0)),
        CompileNode::load_row(row(0, 1)),
    )
    .unwrap();
    let plan = CompileNode::report(Some(tree));
    let err = check(&plan, 3).unwrap_err();
    let PlanError::RowRankMismatch { path, expected, .. } = err else {
        panic!("expected RowRankMismatch, got {err:?}");
    };
    assert_eq!(expected, 0);
    assert_eq!(path.segments(), [0, 0]);
}

#[test]
fn rank_zero_tree_under_report_checks_at_nonzero_rank() {
    let tree = CompileNode::and_tree(
        CompileNode::load_row(row(0, 0)),
        CompileNode::not(CompileNode::load_row(row(0, 1))).unwrap(),
    )
    .unwrap();
    let plan = CompileNode::report(Some(tree));
    assert!(check(&plan, 3).is_ok());
}

#[test]
fn rank_zero_root_is_rejected() {
    let plan = CompileNode::load_row(row(0, 0));
    assert!(matches!(
        check(&plan, 0),
        Err(PlanError::PhaseMismatch { .. })
    ));
}

#[test]
fn error_path_points_at_offending_node() {
    // Report -> LoadRowJz -> RankDown -> LoadRowJz(rank 1 row at rank 0).
    let inner = CompileNode::rank_down(delta(3), load(1, 9, None)).unwrap();
    let plan = CompileNode::report(Some(load(3, 0, Some(inner))));
    let err = check(&plan, 3).unwrap_err();
    let PlanError::RowRankMismatch { path, .. } = err else {
        panic!("expected RowRankMismatch, got {err:?}");
    };
    assert_eq!(path.segments(), [0, 0, 0]);
    assert_eq!(path.to_string(), "root.0.0.0");
}
