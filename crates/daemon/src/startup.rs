// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup side effects (§6): ensure the watch directory and configured
//! groups exist, then sweep any resources orphaned by a previous crash
//! (P-LEAK) before the first tick runs.

use mqic_core::DispatchError;
use mqic_storage::Store;

use crate::config::Config;

pub fn run(config: &Config, store: &Store) -> Result<(), DispatchError> {
    std::fs::create_dir_all(&config.watch_path)
        .map_err(|e| DispatchError::ConfigError(format!("cannot create watch_path {}: {e}", config.watch_path.display())))?;

    for group in &config.pueue_groups {
        store.ensure_gpu_resource_exists(group)?;
    }

    let swept = store.sweep_leaked_resources()?;
    if swept > 0 {
        tracing::warn!(count = swept, "swept leaked gpu resources left over from a previous crash");
    }

    Ok(())
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
