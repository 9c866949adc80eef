// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parallel Dispatcher (C7): bounded-concurrency replacement for the
//! sequential Phase D, with case-id de-duplication across overlapping
//! batches and ticks (§4.7).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mqic_core::{Case, CaseId};
use mqic_executor::RemoteExecutor;
use mqic_storage::Store;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::reconcile::dispatch_one;

#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pub total: AtomicU64,
    pub successful: AtomicU64,
    pub failed: AtomicU64,
    pub dispatch_time_sum_ms: AtomicU64,
    pub peak_concurrency: AtomicU32,
    current_concurrency: AtomicU32,
}

impl DispatchMetrics {
    pub fn success_rate(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.successful.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn mean_dispatch_time_ms(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.dispatch_time_sum_ms.load(Ordering::Relaxed) as f64 / total as f64
    }

    fn enter(&self) -> u32 {
        let current = self.current_concurrency.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_concurrency.fetch_max(current, Ordering::SeqCst);
        current
    }

    fn leave(&self) {
        self.current_concurrency.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mutex-guarded de-duplication set: a case already being dispatched by
/// one worker is skipped by every other worker, across overlapping
/// batches and concurrent ticks.
pub struct ParallelDispatcher<E> {
    store: Arc<Store>,
    executor: Arc<E>,
    max_workers: usize,
    processing_timeout: Duration,
    active_case_ids: Arc<Mutex<HashSet<CaseId>>>,
    pub metrics: Arc<DispatchMetrics>,
}

impl<E: RemoteExecutor + 'static> ParallelDispatcher<E> {
    pub fn new(store: Arc<Store>, executor: Arc<E>, max_workers: usize, processing_timeout: Duration) -> Self {
        Self {
            store,
            executor,
            max_workers,
            processing_timeout,
            active_case_ids: Arc::new(Mutex::new(HashSet::new())),
            metrics: Arc::new(DispatchMetrics::default()),
        }
    }

    /// Dispatch `cases` concurrently, bounded by `max_workers`, with a
    /// per-batch deadline. Cases already in flight from an overlapping
    /// batch or a concurrent tick are silently skipped.
    pub async fn dispatch_batch(&self, cases: Vec<Case>) {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(cases.len());

        for case in cases {
            let already_active = {
                let mut active = self.active_case_ids.lock();
                !active.insert(case.case_id)
            };
            if already_active {
                tracing::debug!(case_id = case.case_id.value(), "skipping case already in flight");
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let store = Arc::clone(&self.store);
            let executor = Arc::clone(&self.executor);
            let active_case_ids = Arc::clone(&self.active_case_ids);
            let metrics = Arc::clone(&self.metrics);
            let allocator = crate::GpuAllocator::new(Arc::clone(&self.store), Arc::clone(&self.executor));

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                metrics.enter();
                let started = Instant::now();

                dispatch_one(&store, &executor, &allocator, &case).await;

                metrics.leave();
                metrics.total.fetch_add(1, Ordering::Relaxed);
                metrics
                    .dispatch_time_sum_ms
                    .fetch_add(started.elapsed().as_millis() as u64, Ordering::Relaxed);
                match store.get_case_by_id(case.case_id).map(|c| c.status) {
                    Some(mqic_core::CaseStatus::Failed) => {
                        metrics.failed.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {
                        metrics.successful.fetch_add(1, Ordering::Relaxed);
                    }
                }
                active_case_ids.lock().remove(&case.case_id);
            });
            handles.push(handle);
        }

        let all = futures_join_all(handles);
        let _ = tokio::time::timeout(self.processing_timeout, all).await;
    }
}

async fn futures_join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
