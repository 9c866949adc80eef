// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GPU-group resource records (§3 Data Model).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a named GPU-group resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuStatus {
    Available,
    Assigned,
    /// A timeout-driven kill failed to confirm; pending retry.
    Zombie,
}

impl fmt::Display for GpuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GpuStatus::Available => "available",
            GpuStatus::Assigned => "assigned",
            GpuStatus::Zombie => "zombie",
        };
        write!(f, "{s}")
    }
}

/// A named slot on the remote queue daemon representing one unit of
/// compute capacity. `status = available` iff `assigned_case_id = None`
/// (invariant 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuResource {
    pub pueue_group: String,
    pub status: GpuStatus,
    pub assigned_case_id: Option<u64>,
}

impl GpuResource {
    /// A freshly registered resource: available, unassigned.
    pub fn new(pueue_group: impl Into<String>) -> Self {
        Self {
            pueue_group: pueue_group.into(),
            status: GpuStatus::Available,
            assigned_case_id: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == GpuStatus::Available && self.assigned_case_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_resource_is_available() {
        let r = GpuResource::new("g0");
        assert!(r.is_available());
        assert_eq!(r.assigned_case_id, None);
    }

    #[test]
    fn display_matches_snake_case_variants() {
        assert_eq!(GpuStatus::Available.to_string(), "available");
        assert_eq!(GpuStatus::Assigned.to_string(), "assigned");
        assert_eq!(GpuStatus::Zombie.to_string(), "zombie");
    }
}
