use super::*;
use mqic_core::{CaseId, Priority};
use std::path::PathBuf;

fn case(id: u64, priority: u8, submitted_hours_ago: f64, now: DateTime<Utc>) -> Case {
    let submitted_at = now - chrono::Duration::seconds((submitted_hours_ago * 3600.0) as i64);
    Case::new(
        CaseId::new(id),
        PathBuf::from(format!("/w/c{id}")),
        Priority::try_from(priority).expect("valid priority"),
        submitted_at,
    )
}

#[test]
fn strict_orders_by_priority_then_submission_time() {
    let now = Utc::now();
    let scheduler = PriorityScheduler::new(PriorityAlgorithm::Strict, 0.1, 24.0);
    let cases = vec![case(1, 2, 1.0, now), case(2, 5, 0.5, now), case(3, 5, 2.0, now)];
    let ordered = scheduler.order(cases, now);
    let ids: Vec<u64> = ordered.iter().map(|c| c.case_id.value()).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[test]
fn weighted_fair_starvation_boost_promotes_old_low_priority_case() {
    // Mirrors seed scenario 6: A priority=3 submitted 1h ago vs B priority=1
    // submitted 30h ago, threshold 24h -> expected order [B, A].
    let now = Utc::now();
    let scheduler = PriorityScheduler::new(PriorityAlgorithm::WeightedFair, 0.1, 24.0);
    let a = case(1, 3, 1.0, now);
    let b = case(2, 1, 30.0, now);
    let ordered = scheduler.order(vec![a, b], now);
    let ids: Vec<u64> = ordered.iter().map(|c| c.case_id.value()).collect();
    assert_eq!(ids, vec![2, 1]);

    let metrics = scheduler.metrics();
    assert_eq!(metrics.starvation_boosts, 1);
}

#[test]
fn aging_bound_gives_starved_normal_case_higher_effective_priority_than_fresh_normal() {
    let now = Utc::now();
    let scheduler = PriorityScheduler::new(PriorityAlgorithm::Aging, 0.1, 24.0);
    let starved = case(1, Priority::NORMAL.value(), 30.0, now);
    let fresh = case(2, Priority::NORMAL.value(), 0.0, now);
    let ordered = scheduler.order(vec![fresh, starved], now);
    assert_eq!(ordered[0].case_id.value(), 1, "starved case must dispatch first");
}

#[test]
fn metrics_track_scheduled_count_and_mean_wait_per_priority() {
    let now = Utc::now();
    let scheduler = PriorityScheduler::new(PriorityAlgorithm::Strict, 0.1, 24.0);
    scheduler.order(vec![case(1, 2, 2.0, now), case(2, 2, 4.0, now)], now);
    let metrics = scheduler.metrics();
    assert_eq!(metrics.scheduled_by_priority.get(&2), Some(&2));
    assert_eq!(metrics.mean_wait_hours(2), Some(3.0));
}
