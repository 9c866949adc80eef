// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed structured logging, with size-based rotation at startup
//! (§6 `logging.path`).

use std::path::Path;

use mqic_core::DispatchError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (mqic.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate `log_path` if it exceeds [`MAX_LOG_SIZE`]. Shifts
/// `mqic.log` -> `mqic.log.1` -> `.2` -> `.3`, deleting the oldest.
/// Best-effort: rotation failures are silently ignored so the daemon
/// still starts.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Install the global tracing subscriber, writing to `log_path` in the
/// background via `tracing-appender`. The returned guard must be kept
/// alive for the process lifetime so buffered records are flushed.
pub fn setup_logging(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, DispatchError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DispatchError::ConfigError(format!("cannot create log directory: {e}")))?;
    }

    let file_name = log_path
        .file_name()
        .ok_or_else(|| DispatchError::ConfigError("logging.path has no file name".to_string()))?;
    let parent = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
