// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing-instrumented wrapper around any `RemoteExecutor`, grounded on
//! the adapters' traced session wrapper.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ExecutorError;
use crate::outcome::{FindByLabelOutcome, GroupUtilization, StatusOutcome, SubmitOutcome};
use crate::RemoteExecutor;

pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: RemoteExecutor> RemoteExecutor for TracedExecutor<E> {
    #[instrument(skip(self, case_path))]
    async fn submit(&self, case_path: &Path, group: &str, label: &str) -> SubmitOutcome {
        let outcome = self.inner.submit(case_path, group, label).await;
        tracing::debug!(?outcome, "submit");
        outcome
    }

    #[instrument(skip(self))]
    async fn status(&self, task_id: u64) -> StatusOutcome {
        let outcome = self.inner.status(task_id).await;
        tracing::debug!(?outcome, "status");
        outcome
    }

    #[instrument(skip(self))]
    async fn kill(&self, task_id: u64) -> bool {
        let killed = self.inner.kill(task_id).await;
        tracing::debug!(killed, "kill");
        killed
    }

    #[instrument(skip(self))]
    async fn find_by_label(&self, label: &str) -> FindByLabelOutcome {
        let outcome = self.inner.find_by_label(label).await;
        tracing::debug!(?outcome, "find_by_label");
        outcome
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> Result<Vec<String>, ExecutorError> {
        self.inner.list_groups().await
    }

    #[instrument(skip(self))]
    async fn utilization(&self) -> Result<HashMap<String, GroupUtilization>, ExecutorError> {
        self.inner.utilization().await
    }
}
