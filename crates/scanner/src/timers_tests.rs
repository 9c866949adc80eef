use super::*;
use std::path::PathBuf;

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).expect("valid timestamp")
}

#[test]
fn fired_returns_only_due_timers_and_removes_them() {
    let mut timers = TimerMap::new();
    timers.reset(PathBuf::from("/w/a"), Duration::seconds(5), t(0));
    timers.reset(PathBuf::from("/w/b"), Duration::seconds(5), t(0));

    assert!(timers.fired(t(3)).is_empty());
    let due: std::collections::HashSet<PathBuf> = timers.fired(t(6)).into_iter().collect();
    let expected: std::collections::HashSet<PathBuf> =
        [PathBuf::from("/w/a"), PathBuf::from("/w/b")].into_iter().collect();
    assert_eq!(due, expected);
    assert!(!timers.has_timers());
}

#[test]
fn reset_extends_an_already_pending_timer() {
    let mut timers = TimerMap::new();
    timers.reset(PathBuf::from("/w/a"), Duration::seconds(5), t(0));
    timers.reset(PathBuf::from("/w/a"), Duration::seconds(5), t(3));
    assert!(timers.fired(t(6)).is_empty());
    assert_eq!(timers.fired(t(8)), vec![PathBuf::from("/w/a")]);
}

#[test]
fn drain_discards_without_firing() {
    let mut timers = TimerMap::new();
    timers.reset(PathBuf::from("/w/a"), Duration::seconds(5), t(0));
    timers.drain();
    assert!(timers.fired(t(100)).is_empty());
}

#[test]
fn next_deadline_is_the_earliest() {
    let mut timers = TimerMap::new();
    timers.reset(PathBuf::from("/w/a"), Duration::seconds(10), t(0));
    timers.reset(PathBuf::from("/w/b"), Duration::seconds(5), t(0));
    assert_eq!(timers.next_deadline(), Some(t(5)));
}
