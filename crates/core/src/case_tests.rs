use super::*;
use crate::Priority;
use std::path::PathBuf;

fn case(status: CaseStatus) -> Case {
    let now = DateTime::UNIX_EPOCH;
    let mut c = Case::new(CaseId::new(1), PathBuf::from("/w/c1"), Priority::NORMAL, now);
    c.status = status;
    c
}

#[test]
fn label_format_matches_spec() {
    assert_eq!(CaseId::new(42).label(), "mqic_case_42");
}

#[test]
fn fresh_case_satisfies_invariant_1() {
    let c = case(CaseStatus::Submitted);
    assert!(c.check_invariants().is_ok());
}

#[test]
fn submitted_with_group_violates_invariant_1() {
    let mut c = case(CaseStatus::Submitted);
    c.pueue_group = Some("g0".into());
    assert!(c.check_invariants().is_err());
}

#[test]
fn submitting_without_group_violates_invariant_2() {
    let c = case(CaseStatus::Submitting);
    assert!(c.check_invariants().is_err());
}

#[test]
fn running_requires_group_and_task_id() {
    let mut c = case(CaseStatus::Running);
    c.pueue_group = Some("g0".into());
    assert!(c.check_invariants().is_err());
    c.pueue_task_id = Some(42);
    assert!(c.check_invariants().is_ok());
}

#[test]
fn terminal_requires_full_progress_and_completed_at() {
    let mut c = case(CaseStatus::Completed);
    assert!(c.check_invariants().is_err());
    c.progress = 100;
    assert!(c.check_invariants().is_err());
    c.completed_at = Some(c.submitted_at);
    assert!(c.check_invariants().is_ok());
}

#[test]
fn status_transitions_reject_terminal_resurrection() {
    assert!(CaseStatus::Submitted.can_transition_to(CaseStatus::Submitting));
    assert!(CaseStatus::Submitting.can_transition_to(CaseStatus::Running));
    assert!(!CaseStatus::Completed.can_transition_to(CaseStatus::Running));
    assert!(!CaseStatus::Submitted.can_transition_to(CaseStatus::Running));
}

#[test]
fn wait_hours_tracks_elapsed_time() {
    let mut c = case(CaseStatus::Submitted);
    c.submitted_at = DateTime::UNIX_EPOCH;
    let now = DateTime::UNIX_EPOCH + chrono::Duration::hours(30);
    assert!((c.wait_hours(now) - 30.0).abs() < 1e-9);
}
