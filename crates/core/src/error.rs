// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the dispatcher.
//!
//! `DispatchError` is the classification the reconciliation loop matches
//! on (see §7 of the design notes): transient remote failures are retried
//! on the next tick, permanent ones terminate the case, invariant
//! violations are fatal for that case only, and config errors abort
//! startup before any tick runs.

use thiserror::Error;

/// Errors returned by the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate case path: {0}")]
    DuplicatePath(String),
    #[error("case {0} not found")]
    CaseNotFound(u64),
    #[error("gpu resource {0:?} not found")]
    ResourceNotFound(String),
    #[error("illegal status transition for case {case_id}: {from:?} -> {to:?}")]
    IllegalTransition {
        case_id: u64,
        from: crate::CaseStatus,
        to: crate::CaseStatus,
    },
    #[error("invariant violated for case {case_id}: {detail}")]
    InvariantViolation { case_id: u64, detail: String },
    #[error("wal error: {0}")]
    Wal(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// High-level classification used by the reconciliation loop and the
/// remote executor. Every fallible operation the tick body performs is
/// expressed in terms of one of these variants so that callers can match
/// on the tag instead of inspecting exception types.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Transport/timeout failure against the remote host. Never terminal
    /// for a case; the next tick retries.
    #[error("transient external failure: {0}")]
    TransientExternal(String),
    /// The remote daemon actively rejected the request, returned
    /// malformed data, or the job vanished. Terminal for the case.
    #[error("permanent external failure: {0}")]
    PermanentExternal(String),
    /// A case's persisted fields contradict the §3 invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// A configuration value is missing or malformed; aborts startup.
    #[error("configuration error: {0}")]
    ConfigError(String),
    /// A case exceeded its allotted wall-clock budget.
    #[error("timeout budget exceeded: {0}")]
    TimeoutBudget(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
