// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production `RemoteExecutor` backed by `ssh`/`scp`/`pueue` subprocesses
//! (§4.2, §6 wire format).

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::outcome::{FindByLabelOutcome, GroupUtilization, StatusOutcome, SubmitOutcome};
use crate::subprocess::{run_with_timeout, RunError, COPY_TIMEOUT, KILL_TIMEOUT, STATUS_TIMEOUT, SUBMIT_TIMEOUT};
use crate::RemoteExecutor;

/// Re-basenames `path` so a crafted `case_path` containing `../` segments
/// can never escape `remote_base_dir` once interpolated into a shell
/// command (§4.2 "Path hygiene").
fn remote_basename(path: &Path) -> Result<String, ExecutorError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ExecutorError::Permanent(format!("case path has no basename: {}", path.display())))
}

/// Single-quotes a shell argument, escaping embedded single quotes.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub struct SshPueueExecutor {
    config: ExecutorConfig,
}

impl SshPueueExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    fn ssh_command(&self, remote_shell_cmd: &str) -> Command {
        let mut cmd = Command::new(&self.config.ssh_command);
        cmd.arg(self.config.user_at_host()).arg(remote_shell_cmd);
        cmd
    }

    async fn run_pueue_status_json(&self) -> Result<serde_json::Value, ExecutorError> {
        let remote_cmd = format!("{} status --json", self.config.pueue_command);
        let cmd = self.ssh_command(&remote_cmd);
        let output = run_with_timeout(cmd, STATUS_TIMEOUT, "pueue status --json")
            .await
            .map_err(|e| ExecutorError::Unreachable(run_error_message(e)))?;
        if !output.status.success() {
            return Err(ExecutorError::Unreachable(format!(
                "pueue status exited {}",
                output.status
            )));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| ExecutorError::Permanent(format!("unparseable pueue status JSON: {e}")))
    }
}

fn run_error_message(e: RunError) -> String {
    match e {
        RunError::TimedOut => "timed out".to_string(),
        RunError::Io(err) => err.to_string(),
    }
}

/// Parses a single task's entry out of `pueue status --json` (§6 wire
/// format: `status` is a flat string, `result` a sibling key read only
/// when `status == "Done"`).
fn parse_task_status(value: &serde_json::Value, task_id: u64) -> StatusOutcome {
    let Some(task) = value.pointer(&format!("/tasks/{task_id}")) else {
        return StatusOutcome::NotFound;
    };
    // §9 Open Questions: a remotely-"Killing" job is treated as failed,
    // not running, so the reconciliation loop doesn't wait on it forever.
    match task.get("status").and_then(|s| s.as_str()) {
        Some("Done") => match task.get("result").and_then(|r| r.as_str()) {
            Some("success") => StatusOutcome::Success,
            _ => StatusOutcome::Failure,
        },
        Some("Failed") | Some("Killing") => StatusOutcome::Failure,
        Some("Queued") | Some("Running") | Some("Paused") | Some("Stashed") => StatusOutcome::Running,
        _ => StatusOutcome::Running,
    }
}

#[async_trait]
impl RemoteExecutor for SshPueueExecutor {
    async fn submit(&self, case_path: &Path, group: &str, label: &str) -> SubmitOutcome {
        let basename = match remote_basename(case_path) {
            Ok(b) => b,
            Err(e) => return SubmitOutcome::Permanent(e.to_string()),
        };
        let remote_dir = format!("{}/{}", self.config.remote_base_dir, basename);

        let mut scp = Command::new(&self.config.scp_command);
        scp.arg("-r")
            .arg(case_path)
            .arg(format!("{}:{}", self.config.user_at_host(), shell_quote(&remote_dir)));
        match run_with_timeout(scp, COPY_TIMEOUT, "scp case directory").await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                return SubmitOutcome::Unreachable(format!("scp exited {}", output.status));
            }
            Err(e) => return SubmitOutcome::Unreachable(run_error_message(e)),
        }

        let remote_shell_cmd = format!(
            "cd {} && {} add --group {} --label {} -- {}",
            shell_quote(&remote_dir),
            self.config.pueue_command,
            shell_quote(group),
            shell_quote(label),
            self.config.remote_command,
        );
        let cmd = self.ssh_command(&remote_shell_cmd);
        let output = match run_with_timeout(cmd, SUBMIT_TIMEOUT, "pueue add").await {
            Ok(output) => output,
            Err(e) => return SubmitOutcome::Unreachable(run_error_message(e)),
        };
        if !output.status.success() {
            return SubmitOutcome::Unreachable(format!("pueue add exited {}", output.status));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id_re = match Regex::new(r"\(id: (\d+)\)") {
            Ok(re) => re,
            Err(_) => return SubmitOutcome::Permanent("internal regex error".to_string()),
        };
        match id_re.captures(&stdout).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse::<u64>().ok()) {
            Some(task_id) => SubmitOutcome::Submitted(task_id),
            None => SubmitOutcome::Permanent(format!("could not parse task id from: {stdout}")),
        }
    }

    async fn status(&self, task_id: u64) -> StatusOutcome {
        let value = match self.run_pueue_status_json().await {
            Ok(v) => v,
            Err(ExecutorError::Unreachable(_)) => return StatusOutcome::Unreachable,
            Err(ExecutorError::Permanent(_)) => return StatusOutcome::Failure,
        };
        parse_task_status(&value, task_id)
    }

    async fn kill(&self, task_id: u64) -> bool {
        let remote_cmd = format!("{} kill {task_id}", self.config.pueue_command);
        let cmd = self.ssh_command(&remote_cmd);
        match run_with_timeout(cmd, KILL_TIMEOUT, "pueue kill").await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    async fn find_by_label(&self, label: &str) -> FindByLabelOutcome {
        let value = match self.run_pueue_status_json().await {
            Ok(v) => v,
            Err(ExecutorError::Unreachable(_)) => return FindByLabelOutcome::Unreachable,
            Err(ExecutorError::Permanent(_)) => return FindByLabelOutcome::NotFound,
        };
        let Some(tasks) = value.get("tasks").and_then(|t| t.as_object()) else {
            return FindByLabelOutcome::NotFound;
        };
        for (id_str, task) in tasks {
            if task.get("label").and_then(|l| l.as_str()) == Some(label) {
                let task_id = id_str.parse::<u64>().ok();
                return FindByLabelOutcome::Found(task_id);
            }
        }
        FindByLabelOutcome::NotFound
    }

    async fn list_groups(&self) -> Result<Vec<String>, ExecutorError> {
        let remote_cmd = format!("{} group", self.config.pueue_command);
        let cmd = self.ssh_command(&remote_cmd);
        let output = run_with_timeout(cmd, STATUS_TIMEOUT, "pueue group")
            .await
            .map_err(|e| ExecutorError::Unreachable(run_error_message(e)))?;
        if !output.status.success() {
            return Err(ExecutorError::Unreachable(format!("pueue group exited {}", output.status)));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let group_re = Regex::new(r"^(\w+)\s+\(running:")
            .map_err(|e| ExecutorError::Permanent(format!("internal regex error: {e}")))?;
        Ok(stdout
            .lines()
            .filter_map(|line| group_re.captures(line))
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect())
    }

    async fn utilization(&self) -> Result<HashMap<String, GroupUtilization>, ExecutorError> {
        let value = self.run_pueue_status_json().await?;
        let mut result: HashMap<String, GroupUtilization> = HashMap::new();
        if let Some(tasks) = value.get("tasks").and_then(|t| t.as_object()) {
            for task in tasks.values() {
                let Some(group) = task.get("group").and_then(|g| g.as_str()) else {
                    continue;
                };
                let entry = result.entry(group.to_string()).or_default();
                match task.get("status").and_then(|s| s.as_str()) {
                    Some("Running") => entry.running += 1,
                    Some("Queued") | Some("Stashed") | Some("Paused") => entry.queued += 1,
                    _ => {}
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
