// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Non-per-task errors from group/utilization introspection calls.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("remote unreachable: {0}")]
    Unreachable(String),
    #[error("remote rejected request: {0}")]
    Permanent(String),
}
