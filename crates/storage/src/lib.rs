// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mqic-storage: durable state store for cases and GPU-group resources.
//!
//! Mutations are appended to a JSONL write-ahead log and applied to an
//! in-memory [`MaterializedState`], guarded by a single-writer mutex.
//! A periodic snapshot lets recovery skip most of the log on restart.

mod event;
mod snapshot;
mod state;
mod store;
mod wal;

pub use event::CaseEvent;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use store::{Store, StoreConfig};
pub use wal::{Wal, WalEntry, WalError};
