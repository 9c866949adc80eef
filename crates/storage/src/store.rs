// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public state-store API (§4.1).
//!
//! `Store` is a single-writer-serialized durable store: every mutating
//! method appends a [`CaseEvent`] to the WAL (fsynced before return),
//! applies it to the in-memory [`MaterializedState`], and returns — the
//! change is guaranteed durable by the time the call returns (§5 rule 2).
//! All methods take `&self` and share one internal mutex, so
//! `find_and_lock_any_available_gpu`'s select-then-update is trivially
//! atomic: no other mutation can be interleaved inside the critical
//! section.

use crate::event::CaseEvent;
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;
use mqic_core::{Case, CaseId, Clock, GpuResource, GpuStatus, Priority, StoreError};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem layout for a `Store`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
}

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

pub struct Store {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl Store {
    /// Open (or create) the store at `config`'s paths, replaying the WAL
    /// on top of the last snapshot.
    pub fn open(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let snapshot = Snapshot::load(&config.snapshot_path)
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;

        let (mut state, snapshot_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (MaterializedState::new(), 0),
        };

        let wal = Wal::open(&config.wal_path, snapshot_seq).map_err(|e| StoreError::Wal(e.to_string()))?;
        for entry in wal
            .entries_after(snapshot_seq)
            .map_err(|e| StoreError::Wal(e.to_string()))?
        {
            state.apply(&entry.event);
        }

        Ok(Self {
            config,
            clock,
            inner: Mutex::new(Inner { state, wal }),
        })
    }

    fn append(&self, inner: &mut Inner, event: CaseEvent) -> Result<(), StoreError> {
        inner
            .wal
            .append(&event)
            .map_err(|e| StoreError::Wal(e.to_string()))?;
        inner.state.apply(&event);
        Ok(())
    }

    /// Write a fresh snapshot and truncate the WAL up to the snapshotted
    /// sequence. Called periodically by the daemon, and once at shutdown.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.write_seq();
        let snapshot = Snapshot::new(seq, inner.state.clone());
        snapshot
            .save(&self.config.snapshot_path)
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;
        inner
            .wal
            .truncate_before(seq)
            .map_err(|e| StoreError::Wal(e.to_string()))?;
        Ok(())
    }

    // ---- case reads ----

    pub fn get_case_by_id(&self, id: CaseId) -> Option<Case> {
        self.inner.lock().state.get_case(id).cloned()
    }

    pub fn get_case_by_path(&self, path: &Path) -> Option<Case> {
        self.inner.lock().state.get_case_by_path(path).cloned()
    }

    pub fn get_cases_by_status(&self, status: mqic_core::CaseStatus) -> Vec<Case> {
        self.inner
            .lock()
            .state
            .cases_by_status(status)
            .into_iter()
            .cloned()
            .collect()
    }

    // ---- case writes ----

    /// Insert a new case in `submitted` at default priority. Fails with
    /// `DuplicatePath` if `path` is already tracked.
    pub fn add_case(&self, path: &Path) -> Result<CaseId, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get_case_by_path(path).is_some() {
            return Err(StoreError::DuplicatePath(path.display().to_string()));
        }
        let case_id = CaseId::new(inner.state.next_case_id);
        let now = self.clock.now();
        self.append(
            &mut inner,
            CaseEvent::CaseAdded {
                case_id,
                case_path: path.to_path_buf(),
                priority: Priority::default(),
                at: now,
            },
        )?;
        Ok(case_id)
    }

    /// Stamps `status_updated_at` and enforces the §3 lifecycle transitions.
    pub fn update_case_status(
        &self,
        id: CaseId,
        status: mqic_core::CaseStatus,
        progress: u8,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get_case(id)
            .ok_or(StoreError::CaseNotFound(id.value()))?;
        if !current.status.can_transition_to(status) {
            return Err(StoreError::IllegalTransition {
                case_id: id.value(),
                from: current.status,
                to: status,
            });
        }
        let now = self.clock.now();
        self.append(
            &mut inner,
            CaseEvent::CaseStatusUpdated {
                case_id: id,
                status,
                progress,
                at: now,
            },
        )
    }

    /// Transition a case to a terminal status (`completed` or `failed`):
    /// sets `progress = 100` and `completed_at`.
    pub fn update_case_completion(
        &self,
        id: CaseId,
        status: mqic_core::CaseStatus,
    ) -> Result<(), StoreError> {
        debug_assert!(status.is_terminal());
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get_case(id)
            .ok_or(StoreError::CaseNotFound(id.value()))?;
        if current.status.is_terminal() {
            // Terminal cases are never mutated again; treat as a no-op so
            // retried tick logic stays idempotent.
            return Ok(());
        }
        let now = self.clock.now();
        self.append(
            &mut inner,
            CaseEvent::CaseCompleted {
                case_id: id,
                status,
                at: now,
            },
        )
    }

    pub fn update_case_pueue_group(&self, id: CaseId, group: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner
            .state
            .get_case(id)
            .ok_or(StoreError::CaseNotFound(id.value()))?;
        let now = self.clock.now();
        self.append(
            &mut inner,
            CaseEvent::CasePueueGroupSet {
                case_id: id,
                group: group.to_string(),
                at: now,
            },
        )
    }

    pub fn update_case_pueue_task_id(&self, id: CaseId, task_id: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner
            .state
            .get_case(id)
            .ok_or(StoreError::CaseNotFound(id.value()))?;
        let now = self.clock.now();
        self.append(
            &mut inner,
            CaseEvent::CasePueueTaskIdSet {
                case_id: id,
                task_id,
                at: now,
            },
        )
    }

    // ---- resource reads ----

    pub fn get_resources_by_status(&self, status: GpuStatus) -> Vec<GpuResource> {
        self.inner
            .lock()
            .state
            .resources_by_status(status)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get_gpu_resource_by_case_id(&self, case_id: CaseId) -> Option<GpuResource> {
        self.inner.lock().state.resource_for_case(case_id).cloned()
    }

    // ---- resource writes ----

    /// Idempotent: registers `group` as an available resource if it is
    /// not already known.
    pub fn ensure_gpu_resource_exists(&self, group: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.resources.contains_key(group) {
            return Ok(());
        }
        self.append(
            &mut inner,
            CaseEvent::ResourceEnsured {
                group: group.to_string(),
            },
        )
    }

    /// Atomically select one `available` resource (lexicographic
    /// tie-break) and lock it to `case_id`, or return `None` if none are
    /// available. Because every `Store` method holds the same mutex for
    /// its whole body, this select-then-update can never race with a
    /// concurrent caller for a different case (P-ATOMIC-LOCK).
    pub fn find_and_lock_any_available_gpu(
        &self,
        case_id: CaseId,
    ) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock();
        let mut available: Vec<String> = inner
            .state
            .resources
            .values()
            .filter(|r| r.is_available())
            .map(|r| r.pueue_group.clone())
            .collect();
        available.sort();

        let Some(group) = available.into_iter().next() else {
            return Ok(None);
        };

        self.append(
            &mut inner,
            CaseEvent::ResourceLocked {
                group: group.clone(),
                case_id,
            },
        )?;
        Ok(Some(group))
    }

    /// Release the resource bound to `case_id`, if any. Idempotent.
    pub fn release_gpu_resource(&self, case_id: CaseId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let Some(group) = inner
            .state
            .resource_for_case(case_id)
            .map(|r| r.pueue_group.clone())
        else {
            return Ok(());
        };
        self.append(&mut inner, CaseEvent::ResourceReleased { group })
    }

    /// Force a resource into `status`, optionally re-stamping its
    /// assigned case. Used to mark `zombie` on a failed timeout-kill and
    /// to recover it back to `available` on a later successful kill.
    pub fn update_gpu_status(
        &self,
        group: &str,
        status: GpuStatus,
        case_id: Option<CaseId>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner
            .state
            .resources
            .get(group)
            .ok_or_else(|| StoreError::ResourceNotFound(group.to_string()))?;
        self.append(
            &mut inner,
            CaseEvent::ResourceStatusSet {
                group: group.to_string(),
                status,
                case_id,
            },
        )
    }

    /// Startup sweep implementing P-LEAK: release any resource still
    /// bound to a terminal case. Phase B's deliberate release-before-
    /// completion ordering (§4.6) can leave exactly this state after a
    /// crash between the two writes. Returns the number of resources
    /// released.
    pub fn sweep_leaked_resources(&self) -> Result<usize, StoreError> {
        let leaked: Vec<CaseId> = {
            let inner = self.inner.lock();
            inner
                .state
                .cases
                .values()
                .filter(|c| c.status.is_terminal())
                .filter(|c| {
                    inner
                        .state
                        .resource_for_case(c.case_id)
                        .map(|r| r.assigned_case_id == Some(c.case_id.value()))
                        .unwrap_or(false)
                })
                .map(|c| c.case_id)
                .collect()
        };
        for case_id in &leaked {
            self.release_gpu_resource(*case_id)?;
        }
        Ok(leaked.len())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
