// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `RemoteExecutor` test double. Submitted tasks get a
//! monotonically increasing id; their terminal outcome and label are
//! programmed by the test via `set_result`/`set_group_utilization`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ExecutorError;
use crate::outcome::{FindByLabelOutcome, GroupUtilization, StatusOutcome, SubmitOutcome};
use crate::RemoteExecutor;

#[derive(Debug, Clone)]
struct FakeTask {
    label: String,
    status: StatusOutcome,
}

pub struct FakeExecutor {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, FakeTask>>,
    groups: Mutex<Vec<String>>,
    utilization: Mutex<HashMap<String, GroupUtilization>>,
    unreachable: std::sync::atomic::AtomicBool,
    reject_submit: Mutex<Option<String>>,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
            groups: Mutex::new(Vec::new()),
            utilization: Mutex::new(HashMap::new()),
            unreachable: std::sync::atomic::AtomicBool::new(false),
            reject_submit: Mutex::new(None),
        }
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(groups: Vec<String>) -> Self {
        let fake = Self::new();
        *fake.groups.lock() = groups;
        fake
    }

    /// All subsequent calls report transport failure, as if the host were
    /// down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// The next `submit` call is rejected permanently instead of accepted.
    pub fn reject_next_submit(&self, reason: &str) {
        *self.reject_submit.lock() = Some(reason.to_string());
    }

    pub fn set_status(&self, task_id: u64, status: StatusOutcome) {
        if let Some(task) = self.tasks.lock().get_mut(&task_id) {
            task.status = status;
        }
    }

    pub fn set_group_utilization(&self, group: &str, utilization: GroupUtilization) {
        self.utilization.lock().insert(group.to_string(), utilization);
    }

    pub fn submitted_count(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn submit(&self, _case_path: &Path, _group: &str, label: &str) -> SubmitOutcome {
        if self.unreachable.load(Ordering::SeqCst) {
            return SubmitOutcome::Unreachable("fake: unreachable".to_string());
        }
        if let Some(reason) = self.reject_submit.lock().take() {
            return SubmitOutcome::Permanent(reason);
        }
        let task_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().insert(
            task_id,
            FakeTask {
                label: label.to_string(),
                status: StatusOutcome::Running,
            },
        );
        SubmitOutcome::Submitted(task_id)
    }

    async fn status(&self, task_id: u64) -> StatusOutcome {
        if self.unreachable.load(Ordering::SeqCst) {
            return StatusOutcome::Unreachable;
        }
        self.tasks
            .lock()
            .get(&task_id)
            .map(|t| t.status)
            .unwrap_or(StatusOutcome::NotFound)
    }

    async fn kill(&self, task_id: u64) -> bool {
        if self.unreachable.load(Ordering::SeqCst) {
            return false;
        }
        let mut tasks = self.tasks.lock();
        if let Some(task) = tasks.get_mut(&task_id) {
            task.status = StatusOutcome::Failure;
            true
        } else {
            false
        }
    }

    async fn find_by_label(&self, label: &str) -> FindByLabelOutcome {
        if self.unreachable.load(Ordering::SeqCst) {
            return FindByLabelOutcome::Unreachable;
        }
        for (id, task) in self.tasks.lock().iter() {
            if task.label == label {
                return FindByLabelOutcome::Found(Some(*id));
            }
        }
        FindByLabelOutcome::NotFound
    }

    async fn list_groups(&self) -> Result<Vec<String>, ExecutorError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ExecutorError::Unreachable("fake: unreachable".to_string()));
        }
        Ok(self.groups.lock().clone())
    }

    async fn utilization(&self) -> Result<HashMap<String, GroupUtilization>, ExecutorError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ExecutorError::Unreachable("fake: unreachable".to_string()));
        }
        Ok(self.utilization.lock().clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
