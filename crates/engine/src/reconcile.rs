// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation Loop (C6): one tick, four ordered phases (§4.6).
//! Phases share no state between ticks beyond what is durable in C1.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mqic_core::{Case, CaseId, CaseStatus, Clock, GpuStatus};
use mqic_executor::{FindByLabelOutcome, RemoteExecutor, StatusOutcome, SubmitOutcome};
use mqic_storage::Store;

use crate::allocator::GpuAllocator;
use crate::config::EngineConfig;
use crate::dispatcher::ParallelDispatcher;
use crate::scheduler::PriorityScheduler;

pub struct ReconciliationLoop<E> {
    store: Arc<Store>,
    executor: Arc<E>,
    clock: Arc<dyn Clock>,
    allocator: GpuAllocator<E>,
    scheduler: Option<PriorityScheduler>,
    dispatcher: Option<ParallelDispatcher<E>>,
    config: EngineConfig,
    shutdown: Arc<AtomicBool>,
}

impl<E: RemoteExecutor + 'static> ReconciliationLoop<E> {
    pub fn new(store: Arc<Store>, executor: Arc<E>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let allocator = GpuAllocator::new(Arc::clone(&store), Arc::clone(&executor));
        let scheduler = config.priority_scheduling_enabled.then(|| {
            PriorityScheduler::new(config.priority_algorithm, config.aging_factor, config.starvation_threshold_hours)
        });
        let dispatcher = config.parallel_enabled.then(|| {
            ParallelDispatcher::new(
                Arc::clone(&store),
                Arc::clone(&executor),
                config.max_workers,
                config.processing_timeout,
            )
        });
        Self {
            store,
            executor,
            clock,
            allocator,
            scheduler,
            dispatcher,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal the loop to stop after completing its current tick (not
    /// its current phase), per §5's cancellation contract.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Drive ticks until shutdown is signalled.
    pub async fn run(&self) {
        loop {
            self.tick().await;
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(self.config.sleep_interval).await;
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    pub async fn tick(&self) {
        self.phase_a_recover_submitting().await;
        self.phase_b_advance_running().await;
        self.phase_c_recover_zombies().await;
        self.phase_d_dispatch_submitted().await;
    }

    async fn phase_a_recover_submitting(&self) {
        for case in self.store.get_cases_by_status(CaseStatus::Submitting) {
            let label = case.label();
            match self.executor.find_by_label(&label).await {
                FindByLabelOutcome::Found(Some(task_id)) => {
                    if let Err(e) = self.store.update_case_pueue_task_id(case.case_id, task_id) {
                        tracing::error!(case_id = case.case_id.value(), error = %e, "phase A: failed to record task id");
                        continue;
                    }
                    let _ = self.store.update_case_status(case.case_id, CaseStatus::Running, 30);
                }
                FindByLabelOutcome::Found(None) | FindByLabelOutcome::NotFound => {
                    let _ = self.store.update_case_completion(case.case_id, CaseStatus::Failed);
                    let _ = self.store.release_gpu_resource(case.case_id);
                }
                FindByLabelOutcome::Unreachable => {
                    // Skip; retried next tick.
                }
            }
        }
    }

    async fn phase_b_advance_running(&self) {
        let now = self.clock.now();
        for case in self.store.get_cases_by_status(CaseStatus::Running) {
            if now - case.status_updated_at > self.config.running_case_timeout {
                self.handle_running_timeout(&case).await;
                continue;
            }

            let Some(task_id) = case.pueue_task_id else {
                tracing::error!(case_id = case.case_id.value(), "invariant violation: running case has no task id");
                let _ = self.store.update_case_completion(case.case_id, CaseStatus::Failed);
                let _ = self.store.release_gpu_resource(case.case_id);
                continue;
            };

            match self.executor.status(task_id).await {
                StatusOutcome::Success => {
                    let _ = self.store.release_gpu_resource(case.case_id);
                    let _ = self.store.update_case_completion(case.case_id, CaseStatus::Completed);
                }
                StatusOutcome::Failure | StatusOutcome::NotFound => {
                    let _ = self.store.release_gpu_resource(case.case_id);
                    let _ = self.store.update_case_completion(case.case_id, CaseStatus::Failed);
                }
                StatusOutcome::Running => {}
                StatusOutcome::Unreachable => {}
            }
        }
    }

    async fn handle_running_timeout(&self, case: &Case) {
        let Some(task_id) = case.pueue_task_id else {
            tracing::error!(case_id = case.case_id.value(), "invariant violation: timed-out case has no task id");
            let _ = self.store.update_case_completion(case.case_id, CaseStatus::Failed);
            let _ = self.store.release_gpu_resource(case.case_id);
            return;
        };
        let killed = self.executor.kill(task_id).await;
        let _ = self.store.update_case_completion(case.case_id, CaseStatus::Failed);
        if killed {
            let _ = self.store.release_gpu_resource(case.case_id);
        } else if let Some(group) = &case.pueue_group {
            let _ = self
                .store
                .update_gpu_status(group, GpuStatus::Zombie, Some(case.case_id));
        }
    }

    async fn phase_c_recover_zombies(&self) {
        for resource in self.store.get_resources_by_status(GpuStatus::Zombie) {
            let Some(case_id_raw) = resource.assigned_case_id else {
                tracing::error!(group = %resource.pueue_group, "zombie resource has no assigned case; needs manual intervention");
                continue;
            };
            let case_id = CaseId::new(case_id_raw);
            let Some(task_id) = self.store.get_case_by_id(case_id).and_then(|c| c.pueue_task_id) else {
                tracing::error!(group = %resource.pueue_group, case_id = case_id_raw, "zombie resource's case has no task id; needs manual intervention");
                continue;
            };
            if self.executor.kill(task_id).await {
                let _ = self.store.release_gpu_resource(case_id);
            }
        }
    }

    async fn phase_d_dispatch_submitted(&self) {
        let now = self.clock.now();
        let mut submitted = self.store.get_cases_by_status(CaseStatus::Submitted);
        submitted = match &self.scheduler {
            Some(scheduler) => scheduler.order(submitted, now),
            None => {
                submitted.sort_by_key(|c| c.submitted_at);
                submitted
            }
        };
        submitted.truncate(self.config.dispatch_batch_size);

        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch_batch(submitted).await;
            return;
        }

        for case in &submitted {
            let obtained = dispatch_one(&self.store, self.executor.as_ref(), &self.allocator, case).await;
            if !obtained {
                tracing::debug!("gpu pool exhausted; deferring remaining submitted cases to next tick");
                break;
            }
        }
    }
}

/// Obtain a resource and submit a single `submitted` case. Returns
/// `true` if a resource was obtained (regardless of the submit
/// outcome), `false` if the pool was exhausted and the case must wait.
/// Shared by the sequential Phase D above and each parallel-dispatcher
/// worker in C7.
pub async fn dispatch_one<E: RemoteExecutor>(
    store: &Store,
    executor: &E,
    allocator: &GpuAllocator<E>,
    case: &Case,
) -> bool {
    let Some(group) = allocator.allocate(case.case_id).await else {
        return false;
    };
    if let Err(e) = store.update_case_pueue_group(case.case_id, &group) {
        tracing::error!(case_id = case.case_id.value(), error = %e, "failed to record pueue group");
        return true;
    }
    if let Err(e) = store.update_case_status(case.case_id, CaseStatus::Submitting, 10) {
        tracing::error!(case_id = case.case_id.value(), error = %e, "failed to mark submitting");
        return true;
    }
    let label = case.label();
    match executor.submit(&case.case_path, &group, &label).await {
        SubmitOutcome::Submitted(task_id) => {
            let _ = store.update_case_pueue_task_id(case.case_id, task_id);
            let _ = store.update_case_status(case.case_id, CaseStatus::Running, 30);
        }
        SubmitOutcome::Permanent(reason) => {
            tracing::warn!(case_id = case.case_id.value(), reason, "remote rejected submission");
            let _ = store.update_case_completion(case.case_id, CaseStatus::Failed);
            let _ = store.release_gpu_resource(case.case_id);
        }
        SubmitOutcome::Unreachable(reason) => {
            tracing::warn!(case_id = case.case_id.value(), reason, "remote unreachable during submit; deferring to phase A");
        }
    }
    true
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
