// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level tuning knobs, one-to-one with the `main_loop.*` keys (§6).

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityAlgorithm {
    Strict,
    Aging,
    WeightedFair,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sleep_interval: Duration,
    pub running_case_timeout: chrono::Duration,
    pub dispatch_batch_size: usize,

    pub parallel_enabled: bool,
    pub max_workers: usize,
    pub processing_timeout: Duration,

    pub priority_scheduling_enabled: bool,
    pub priority_algorithm: PriorityAlgorithm,
    pub aging_factor: f64,
    pub starvation_threshold_hours: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sleep_interval: Duration::from_secs(10),
            running_case_timeout: chrono::Duration::hours(24),
            dispatch_batch_size: 10,
            parallel_enabled: false,
            max_workers: 4,
            processing_timeout: Duration::from_secs(300),
            priority_scheduling_enabled: false,
            priority_algorithm: PriorityAlgorithm::WeightedFair,
            aging_factor: 0.1,
            starvation_threshold_hours: 24.0,
        }
    }
}
