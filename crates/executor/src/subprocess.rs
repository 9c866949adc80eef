// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout-wrapped subprocess execution for the ssh/scp/pueue calls.

use std::time::Duration;
use tokio::process::Command;

/// Per-call timeouts (§5 Concurrency & Resource Model).
pub const COPY_TIMEOUT: Duration = Duration::from_secs(300);
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(60);
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);
pub const KILL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum RunError {
    /// The call exceeded `timeout`.
    TimedOut,
    /// The process could not be spawned or its output could not be read.
    Io(std::io::Error),
}

/// Run `cmd` to completion, bounded by `timeout`. Any failure to spawn,
/// connect, or complete in time is surfaced uniformly so the caller can
/// collapse it into `unreachable` without inspecting exit codes for
/// transport-vs-domain distinctions.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<std::process::Output, RunError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            tracing::warn!(description, error = %e, "subprocess failed to run");
            Err(RunError::Io(e))
        }
        Err(_) => {
            tracing::warn!(description, timeout_secs = timeout.as_secs(), "subprocess timed out");
            Err(RunError::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_command_returns_output() {
        let cmd = Command::new("true");
        let result = run_with_timeout(cmd, Duration::from_secs(5), "true").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn timeout_is_reported_distinctly() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let result = run_with_timeout(cmd, Duration::from_millis(50), "sleep").await;
        assert!(matches!(result, Err(RunError::TimedOut)));
    }
}
