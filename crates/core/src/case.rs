// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Case` entity and its status machine (§3 Data Model).

use crate::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Unique monotonic integer identifying a case, assigned on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseId(u64);

impl CaseId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The label attached at submission so a crashed-and-restarted
    /// process can relocate the job on the remote queue daemon.
    pub fn label(self) -> String {
        format!("mqic_case_{}", self.0)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CaseId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Status of a case's lifecycle. Terminal statuses (`Completed`, `Failed`)
/// are never left; there is no deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Submitted,
    Submitting,
    Running,
    Completed,
    Failed,
}

impl CaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Failed)
    }

    /// Whether `from -> self` is a legal transition per the case lifecycle
    /// (§3: `submitted -> submitting -> running -> terminal`). Terminal
    /// statuses admit no further transition. Any non-terminal status may
    /// jump directly to a terminal one (crash recovery, timeout, remote
    /// rejection all short-circuit straight to `failed`/`completed`).
    pub fn can_transition_to(self, to: CaseStatus) -> bool {
        use CaseStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, to) {
            (Submitted, Submitting) => true,
            (Submitting, Running) => true,
            (Submitting, Submitting) => true,
            (Running, Running) => true,
            (_, Completed) | (_, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Submitted => "submitted",
            CaseStatus::Submitting => "submitting",
            CaseStatus::Running => "running",
            CaseStatus::Completed => "completed",
            CaseStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A staged case directory plus its persisted lifecycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: CaseId,
    pub case_path: PathBuf,
    pub status: CaseStatus,
    pub progress: u8,
    pub pueue_group: Option<String>,
    pub pueue_task_id: Option<u64>,
    pub priority: Priority,
    pub submitted_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Case {
    /// A freshly inserted case: `submitted`, no resource, no task id.
    pub fn new(case_id: CaseId, case_path: PathBuf, priority: Priority, now: DateTime<Utc>) -> Self {
        Self {
            case_id,
            case_path,
            status: CaseStatus::Submitted,
            progress: 0,
            pueue_group: None,
            pueue_task_id: None,
            priority,
            submitted_at: now,
            status_updated_at: now,
            completed_at: None,
        }
    }

    pub fn label(&self) -> String {
        self.case_id.label()
    }

    /// Hours elapsed since `submitted_at`, used by the aging and
    /// weighted-fair scheduling algorithms.
    pub fn wait_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.submitted_at).num_seconds() as f64 / 3600.0
    }

    /// Check the case's fields against the §3 invariants 1-4 and 7.
    /// Invariants 5 and 6 are cross-entity and checked by the store.
    pub fn check_invariants(&self) -> Result<(), String> {
        match self.status {
            CaseStatus::Submitted => {
                if self.pueue_group.is_some() || self.pueue_task_id.is_some() {
                    return Err("submitted case must have null group and task id".into());
                }
            }
            CaseStatus::Submitting => {
                if self.pueue_group.is_none() {
                    return Err("submitting case must have a bound group".into());
                }
                if self.pueue_task_id.is_some() {
                    return Err("submitting case must not yet have a task id".into());
                }
            }
            CaseStatus::Running => {
                if self.pueue_group.is_none() || self.pueue_task_id.is_none() {
                    return Err("running case must have both group and task id".into());
                }
            }
            CaseStatus::Completed | CaseStatus::Failed => {
                if self.progress != 100 {
                    return Err("terminal case must have progress = 100".into());
                }
                if self.completed_at.is_none() {
                    return Err("terminal case must have completed_at set".into());
                }
            }
        }
        if let Some(completed_at) = self.completed_at {
            if completed_at < self.submitted_at {
                return Err("completed_at must be >= submitted_at".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "case_tests.rs"]
mod tests;
