// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority Scheduler (C5): orders `submitted` cases for dispatch under
//! one of three algorithms (§4.5). Stateless w.r.t. persistence; records
//! only in-memory metrics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mqic_core::{Case, Priority};
use parking_lot::Mutex;

use crate::config::PriorityAlgorithm;

const DEFAULT_WEIGHTS: [(u8, f64); 5] = [(1, 1.0), (2, 2.0), (3, 4.0), (4, 8.0), (5, 16.0)];
const STARVATION_BOOST: f64 = 2.0;

fn weight_for(priority: Priority) -> f64 {
    DEFAULT_WEIGHTS
        .iter()
        .find(|(p, _)| *p == priority.value())
        .map(|(_, w)| *w)
        .unwrap_or(1.0)
}

#[derive(Debug, Default, Clone)]
pub struct SchedulerMetrics {
    pub scheduled_by_priority: HashMap<u8, u64>,
    pub starvation_boosts: u64,
    wait_hours_sum_by_priority: HashMap<u8, f64>,
}

impl SchedulerMetrics {
    fn record(&mut self, case: &Case, wait_hours: f64, boosted: bool) {
        *self.scheduled_by_priority.entry(case.priority.value()).or_insert(0) += 1;
        *self
            .wait_hours_sum_by_priority
            .entry(case.priority.value())
            .or_insert(0.0) += wait_hours;
        if boosted {
            self.starvation_boosts += 1;
        }
    }

    pub fn mean_wait_hours(&self, priority: u8) -> Option<f64> {
        let count = *self.scheduled_by_priority.get(&priority)?;
        if count == 0 {
            return None;
        }
        let sum = *self.wait_hours_sum_by_priority.get(&priority)?;
        Some(sum / count as f64)
    }
}

pub struct PriorityScheduler {
    algorithm: PriorityAlgorithm,
    aging_factor: f64,
    starvation_threshold_hours: f64,
    metrics: Mutex<SchedulerMetrics>,
}

impl PriorityScheduler {
    pub fn new(algorithm: PriorityAlgorithm, aging_factor: f64, starvation_threshold_hours: f64) -> Self {
        Self {
            algorithm,
            aging_factor,
            starvation_threshold_hours,
            metrics: Mutex::new(SchedulerMetrics::default()),
        }
    }

    pub fn set_algorithm(&mut self, algorithm: PriorityAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics.lock().clone()
    }

    /// Order `cases` for dispatch, recording scheduling metrics for each.
    pub fn order(&self, mut cases: Vec<Case>, now: DateTime<Utc>) -> Vec<Case> {
        let mut metrics = self.metrics.lock();
        match self.algorithm {
            PriorityAlgorithm::Strict => {
                cases.sort_by(|a, b| {
                    b.priority
                        .value()
                        .cmp(&a.priority.value())
                        .then(a.submitted_at.cmp(&b.submitted_at))
                });
                for case in &cases {
                    metrics.record(case, case.wait_hours(now), false);
                }
            }
            PriorityAlgorithm::Aging => {
                let mut scored: Vec<(f64, bool, Case)> = cases
                    .into_iter()
                    .map(|c| {
                        let wait_hours = c.wait_hours(now);
                        let boosted = c.priority.is_at_most_normal() && wait_hours > self.starvation_threshold_hours;
                        let mut effective = c.priority.value() as f64 + self.aging_factor * wait_hours;
                        if boosted {
                            effective += STARVATION_BOOST;
                        }
                        (effective, boosted, c)
                    })
                    .collect();
                scored.sort_by(|(ea, _, a), (eb, _, b)| {
                    eb.partial_cmp(ea)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.submitted_at.cmp(&b.submitted_at))
                });
                cases = scored
                    .into_iter()
                    .map(|(_, boosted, c)| {
                        metrics.record(&c, c.wait_hours(now), boosted);
                        c
                    })
                    .collect();
            }
            PriorityAlgorithm::WeightedFair => {
                let mut scored: Vec<(f64, bool, Case)> = cases
                    .into_iter()
                    .map(|c| {
                        let wait_hours = c.wait_hours(now);
                        let boosted = c.priority.is_at_most_normal() && wait_hours > self.starvation_threshold_hours;
                        let mut score = weight_for(c.priority) * (1.0 + 0.05 * wait_hours);
                        if boosted {
                            score *= 2.0;
                        }
                        (score, boosted, c)
                    })
                    .collect();
                scored.sort_by(|(sa, _, a), (sb, _, b)| {
                    sb.partial_cmp(sa)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.submitted_at.cmp(&b.submitted_at))
                });
                cases = scored
                    .into_iter()
                    .map(|(_, boosted, c)| {
                        metrics.record(&c, c.wait_hours(now), boosted);
                        c
                    })
                    .collect();
            }
        }
        cases
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
