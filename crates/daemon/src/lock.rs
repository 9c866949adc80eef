// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance enforcement via an exclusive advisory lock on a PID file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use mqic_core::DispatchError;

/// Held for the process lifetime; the OS releases the advisory lock when
/// this (and the underlying fd) is dropped.
pub struct InstanceLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

impl InstanceLock {
    /// Acquire the lock at `path`, creating the file if absent. Returns
    /// `DispatchError::ConfigError` if another instance already holds it.
    pub fn acquire(path: &Path) -> Result<Self, DispatchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DispatchError::ConfigError(format!("cannot create {}: {e}", parent.display())))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| DispatchError::ConfigError(format!("cannot open lock file {}: {e}", path.display())))?;
        file.try_lock_exclusive().map_err(|_| {
            DispatchError::ConfigError(format!(
                "another mqic instance is already running (lock held at {})",
                path.display()
            ))
        })?;
        file.set_len(0)
            .map_err(|e| DispatchError::ConfigError(format!("cannot truncate lock file: {e}")))?;
        writeln!(file, "{}", std::process::id())
            .map_err(|e| DispatchError::ConfigError(format!("cannot write pid to lock file: {e}")))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
