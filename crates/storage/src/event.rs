// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL event types. Every mutating `Store` method appends exactly one of
//! these before applying the change to the materialized state, so replay
//! after a snapshot reproduces the same state deterministically.

use chrono::{DateTime, Utc};
use mqic_core::{CaseId, CaseStatus, GpuStatus, Priority};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaseEvent {
    CaseAdded {
        case_id: CaseId,
        case_path: PathBuf,
        priority: Priority,
        at: DateTime<Utc>,
    },
    CaseStatusUpdated {
        case_id: CaseId,
        status: CaseStatus,
        progress: u8,
        at: DateTime<Utc>,
    },
    CaseCompleted {
        case_id: CaseId,
        status: CaseStatus,
        at: DateTime<Utc>,
    },
    CasePueueGroupSet {
        case_id: CaseId,
        group: String,
        at: DateTime<Utc>,
    },
    CasePueueTaskIdSet {
        case_id: CaseId,
        task_id: u64,
        at: DateTime<Utc>,
    },
    ResourceEnsured {
        group: String,
    },
    ResourceLocked {
        group: String,
        case_id: CaseId,
    },
    ResourceReleased {
        group: String,
    },
    ResourceStatusSet {
        group: String,
        status: GpuStatus,
        case_id: Option<CaseId>,
    },
}
