// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory materialization of cases and GPU resources, rebuilt from a
//! snapshot plus WAL replay on startup and kept current by [`apply`](MaterializedState::apply)
//! as new events are appended.

use crate::event::CaseEvent;
use mqic_core::{Case, CaseId, GpuResource, GpuStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    pub cases: HashMap<CaseId, Case>,
    pub case_paths: HashMap<PathBuf, CaseId>,
    pub resources: HashMap<String, GpuResource>,
    pub next_case_id: u64,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_case(&self, id: CaseId) -> Option<&Case> {
        self.cases.get(&id)
    }

    pub fn get_case_by_path(&self, path: &std::path::Path) -> Option<&Case> {
        self.case_paths.get(path).and_then(|id| self.cases.get(id))
    }

    pub fn cases_by_status(&self, status: mqic_core::CaseStatus) -> Vec<&Case> {
        self.cases.values().filter(|c| c.status == status).collect()
    }

    pub fn resources_by_status(&self, status: GpuStatus) -> Vec<&GpuResource> {
        self.resources
            .values()
            .filter(|r| r.status == status)
            .collect()
    }

    pub fn resource_for_case(&self, case_id: CaseId) -> Option<&GpuResource> {
        self.resources
            .values()
            .find(|r| r.assigned_case_id == Some(case_id.value()))
    }

    /// Apply a replayed or freshly appended event to the state. This is
    /// the single place that mutates `cases`/`resources`; it never
    /// validates invariants itself — that is the caller's (`Store`'s)
    /// responsibility before the event is constructed.
    pub fn apply(&mut self, event: &CaseEvent) {
        match event {
            CaseEvent::CaseAdded {
                case_id,
                case_path,
                priority,
                at,
            } => {
                let case = Case::new(*case_id, case_path.clone(), *priority, *at);
                self.case_paths.insert(case_path.clone(), *case_id);
                self.cases.insert(*case_id, case);
                if case_id.value() >= self.next_case_id {
                    self.next_case_id = case_id.value() + 1;
                }
            }
            CaseEvent::CaseStatusUpdated {
                case_id,
                status,
                progress,
                at,
            } => {
                if let Some(c) = self.cases.get_mut(case_id) {
                    c.status = *status;
                    c.progress = *progress;
                    c.status_updated_at = *at;
                }
            }
            CaseEvent::CaseCompleted { case_id, status, at } => {
                if let Some(c) = self.cases.get_mut(case_id) {
                    c.status = *status;
                    c.progress = 100;
                    c.status_updated_at = *at;
                    c.completed_at = Some(*at);
                    // §3: cleared on terminal transition, after the resource
                    // has already been released in Phase B.
                    c.pueue_group = None;
                }
            }
            CaseEvent::CasePueueGroupSet { case_id, group, at } => {
                if let Some(c) = self.cases.get_mut(case_id) {
                    c.pueue_group = Some(group.clone());
                    c.status_updated_at = *at;
                }
            }
            CaseEvent::CasePueueTaskIdSet {
                case_id,
                task_id,
                at,
            } => {
                if let Some(c) = self.cases.get_mut(case_id) {
                    c.pueue_task_id = Some(*task_id);
                    c.status_updated_at = *at;
                }
            }
            CaseEvent::ResourceEnsured { group } => {
                self.resources
                    .entry(group.clone())
                    .or_insert_with(|| GpuResource::new(group.clone()));
            }
            CaseEvent::ResourceLocked { group, case_id } => {
                if let Some(r) = self.resources.get_mut(group) {
                    r.status = GpuStatus::Assigned;
                    r.assigned_case_id = Some(case_id.value());
                }
            }
            CaseEvent::ResourceReleased { group } => {
                if let Some(r) = self.resources.get_mut(group) {
                    r.status = GpuStatus::Available;
                    r.assigned_case_id = None;
                }
            }
            CaseEvent::ResourceStatusSet {
                group,
                status,
                case_id,
            } => {
                if let Some(r) = self.resources.get_mut(group) {
                    r.status = *status;
                    r.assigned_case_id = case_id.map(|c| c.value());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
