// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GPU Allocator (C4): stateless. Correctness rests entirely on the
//! store's atomic `find_and_lock_any_available_gpu`; the live-utilization
//! ranking here is advisory only (§4.4).

use std::collections::HashMap;
use std::sync::Arc;

use mqic_core::CaseId;
use mqic_executor::{GroupUtilization, RemoteExecutor};
use mqic_storage::Store;

pub struct GpuAllocator<E> {
    store: Arc<Store>,
    executor: Arc<E>,
}

impl<E: RemoteExecutor> GpuAllocator<E> {
    pub fn new(store: Arc<Store>, executor: Arc<E>) -> Self {
        Self { store, executor }
    }

    /// Resolve the resource group for `case_id`: an already-bound
    /// resource if the process crashed mid-dispatch (§4.6 Phase A's
    /// sibling recovery path), otherwise a freshly locked one.
    pub async fn allocate(&self, case_id: CaseId) -> Option<String> {
        if let Some(resource) = self.store.get_gpu_resource_by_case_id(case_id) {
            tracing::debug!(
                case_id = case_id.value(),
                group = %resource.pueue_group,
                "resuming previously locked resource"
            );
            return Some(resource.pueue_group);
        }

        if let Ok(utilization) = self.executor.utilization().await {
            log_ranking(&utilization);
        }

        match self.store.find_and_lock_any_available_gpu(case_id) {
            Ok(group) => group,
            Err(e) => {
                tracing::error!(case_id = case_id.value(), error = %e, "allocator lock failed");
                None
            }
        }
    }
}

fn log_ranking(utilization: &HashMap<String, GroupUtilization>) {
    let mut ranked: Vec<(&String, u32)> = utilization
        .iter()
        .map(|(group, u)| (group, u.total_load()))
        .collect();
    ranked.sort_by_key(|(_, load)| *load);
    tracing::debug!(?ranked, "advisory group utilization ranking");
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
