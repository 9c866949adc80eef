// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-directory quiescence timers (§4.3), grounded on the reconciliation
//! engine's timer-map scheduler: a map of deadlines, polled rather than
//! driven by one OS timer per entry.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
struct Timer {
    fires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TimerMap {
    timers: HashMap<PathBuf, Timer>,
}

impl TimerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)starts `path`'s timer to fire `duration` after `now`. Repeated
    /// activity under a pending directory keeps resetting this same
    /// deadline rather than accumulating separate timers.
    pub fn reset(&mut self, path: PathBuf, duration: Duration, now: DateTime<Utc>) {
        self.timers.insert(path, Timer { fires_at: now + duration });
    }

    /// Removes and returns every directory whose timer is due by `now`.
    pub fn fired(&mut self, now: DateTime<Utc>) -> Vec<PathBuf> {
        let due: Vec<PathBuf> = self
            .timers
            .iter()
            .filter(|(_, t)| t.fires_at <= now)
            .map(|(p, _)| p.clone())
            .collect();
        for path in &due {
            self.timers.remove(path);
        }
        due
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.values().map(|t| t.fires_at).min()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Discards every pending timer without firing it (shutdown drain,
    /// §5 Cancellation).
    pub fn drain(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
