// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional read-only dashboard child process (§6 `dashboard.auto_start`).
//! Terminated gracefully on shutdown, then forced after a 5 s grace period.

use std::time::Duration;

use tokio::process::{Child, Command};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct Dashboard {
    child: Child,
}

impl Dashboard {
    /// Spawn the dashboard binary if present on `PATH`. Returns `None`
    /// (logging a warning) rather than failing daemon startup — the
    /// dashboard is a convenience, not a dependency of §4's components.
    pub fn spawn() -> Option<Self> {
        match Command::new("mqic-dashboard").kill_on_drop(true).spawn() {
            Ok(child) => {
                tracing::info!("dashboard child process started");
                Some(Self { child })
            }
            Err(e) => {
                tracing::warn!(error = %e, "dashboard not started (binary not found or failed to spawn)");
                None
            }
        }
    }

    /// Send SIGTERM (via the `kill` utility, consistent with how the
    /// remote side is driven over `ssh` elsewhere in this workspace) and
    /// wait up to [`SHUTDOWN_GRACE`]; force-kill if it hasn't exited by
    /// then.
    pub async fn shutdown(mut self) {
        if let Some(id) = self.child.id() {
            let _ = Command::new("kill").arg("-TERM").arg(id.to_string()).status().await;
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await.is_err() {
            tracing::warn!("dashboard did not exit within the grace period, killing it");
            let _ = self.child.start_kill();
            let _ = self.child.wait().await;
        }
    }
}
