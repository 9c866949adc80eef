// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mqic-core: shared domain types for the MQI case dispatcher.

pub mod case;
pub mod clock;
pub mod error;
pub mod priority;
pub mod resource;

pub use case::{Case, CaseId, CaseStatus};
pub use clock::{Clock, SystemClock};
pub use error::{DispatchError, StoreError};
pub use priority::Priority;
pub use resource::{GpuResource, GpuStatus};

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
