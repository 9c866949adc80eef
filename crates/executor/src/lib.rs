// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mqic-executor: the opaque wrapper around the remote queue daemon (C2).
//!
//! `RemoteExecutor` is the only component besides the case scanner that
//! talks to the outside world. Every method classifies its outcome into a
//! fixed tagged result instead of raising: transport failures of any kind
//! (non-zero shell exit, connect error, timeout) collapse to
//! `unreachable`, never to a domain-level failure.

mod config;
mod error;
mod outcome;
mod ssh;
mod subprocess;
mod traced;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use config::ExecutorConfig;
pub use error::ExecutorError;
pub use outcome::{FindByLabelOutcome, GroupUtilization, StatusOutcome, SubmitOutcome};
pub use ssh::SshPueueExecutor;
pub use traced::TracedExecutor;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Opaque wrapper around the remote daemon: submit, poll, kill, and
/// locate jobs by label, plus group introspection for the allocator.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Copy `case_path` to the remote host and submit it under `group`
    /// tagged with `label`.
    async fn submit(&self, case_path: &Path, group: &str, label: &str) -> SubmitOutcome;

    /// Poll the remote status of a previously submitted task.
    async fn status(&self, task_id: u64) -> StatusOutcome;

    /// Best-effort kill; `true` only on a confirmed kill.
    async fn kill(&self, task_id: u64) -> bool;

    /// Locate a task by its submission label, for orphan recovery after
    /// a crash mid-dispatch.
    async fn find_by_label(&self, label: &str) -> FindByLabelOutcome;

    /// The configured remote groups, as currently known to the daemon.
    async fn list_groups(&self) -> Result<Vec<String>, ExecutorError>;

    /// Live running/queued counts per group, for allocator ranking.
    async fn utilization(&self) -> Result<HashMap<String, GroupUtilization>, ExecutorError>;
}
