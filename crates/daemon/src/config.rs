// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration, one-to-one with the `Section.key` table (§6).
//! Required keys abort startup when absent; everything else falls back
//! to the documented default.

use std::path::PathBuf;

use mqic_core::DispatchError;
use mqic_engine::{EngineConfig, PriorityAlgorithm};
use mqic_executor::ExecutorConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawConfig {
    database: RawDatabase,
    scanner: RawScanner,
    #[serde(default)]
    main_loop: RawMainLoop,
    pueue: RawPueue,
    hpc: RawHpc,
    #[serde(default)]
    logging: RawLogging,
    #[serde(default)]
    dashboard: RawDashboard,
}

#[derive(Debug, Deserialize)]
struct RawDatabase {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawScanner {
    watch_path: PathBuf,
    #[serde(default = "default_quiescence_period_seconds")]
    quiescence_period_seconds: i64,
}

fn default_quiescence_period_seconds() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawMainLoop {
    sleep_interval_seconds: u64,
    running_case_timeout_hours: i64,
    parallel_processing: RawParallelProcessing,
    priority_scheduling: RawPriorityScheduling,
}

impl Default for RawMainLoop {
    fn default() -> Self {
        Self {
            sleep_interval_seconds: 10,
            running_case_timeout_hours: 24,
            parallel_processing: RawParallelProcessing::default(),
            priority_scheduling: RawPriorityScheduling::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawParallelProcessing {
    enabled: bool,
    max_workers: usize,
    batch_size: usize,
}

impl Default for RawParallelProcessing {
    fn default() -> Self {
        Self {
            enabled: false,
            max_workers: 4,
            batch_size: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawPriorityScheduling {
    enabled: bool,
    algorithm: String,
    aging_factor: f64,
    starvation_threshold_hours: f64,
}

impl Default for RawPriorityScheduling {
    fn default() -> Self {
        Self {
            enabled: false,
            algorithm: "weighted_fair".to_string(),
            aging_factor: 0.1,
            starvation_threshold_hours: 24.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPueue {
    groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawHpc {
    host: String,
    user: String,
    remote_base_dir: String,
    remote_command: String,
    #[serde(default = "default_scp_command")]
    scp_command: String,
    #[serde(default = "default_ssh_command")]
    ssh_command: String,
    #[serde(default = "default_pueue_command")]
    pueue_command: String,
}

fn default_scp_command() -> String {
    "scp".to_string()
}
fn default_ssh_command() -> String {
    "ssh".to_string()
}
fn default_pueue_command() -> String {
    "pueue".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLogging {
    path: PathBuf,
}

impl Default for RawLogging {
    fn default() -> Self {
        Self {
            path: PathBuf::from("communicator_fallback.log"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDashboard {
    auto_start: bool,
}

impl Default for RawDashboard {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

/// Fully validated daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub watch_path: PathBuf,
    pub quiescence_period: chrono::Duration,
    pub pueue_groups: Vec<String>,
    pub logging_path: PathBuf,
    pub dashboard_auto_start: bool,
    pub executor: ExecutorConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Read and validate the TOML file at `path`. Missing required keys
    /// or an empty `pueue.groups` abort startup.
    pub fn load(path: &std::path::Path) -> Result<Self, DispatchError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DispatchError::ConfigError(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&text)
    }

    fn parse(text: &str) -> Result<Self, DispatchError> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| DispatchError::ConfigError(format!("invalid config: {e}")))?;

        if raw.pueue.groups.is_empty() {
            return Err(DispatchError::ConfigError(
                "pueue.groups must be non-empty".to_string(),
            ));
        }
        if raw.hpc.host.is_empty() || raw.hpc.user.is_empty() || raw.hpc.remote_base_dir.is_empty() {
            return Err(DispatchError::ConfigError(
                "hpc.host, hpc.user and hpc.remote_base_dir are required".to_string(),
            ));
        }

        let algorithm = match raw.main_loop.priority_scheduling.algorithm.as_str() {
            "strict" => PriorityAlgorithm::Strict,
            "aging" => PriorityAlgorithm::Aging,
            "weighted_fair" => PriorityAlgorithm::WeightedFair,
            other => {
                return Err(DispatchError::ConfigError(format!(
                    "unknown main_loop.priority_scheduling.algorithm: {other}"
                )))
            }
        };

        Ok(Self {
            database_path: raw.database.path,
            watch_path: raw.scanner.watch_path,
            quiescence_period: chrono::Duration::seconds(raw.scanner.quiescence_period_seconds),
            pueue_groups: raw.pueue.groups,
            logging_path: raw.logging.path,
            dashboard_auto_start: raw.dashboard.auto_start,
            executor: ExecutorConfig {
                host: raw.hpc.host,
                user: raw.hpc.user,
                remote_base_dir: raw.hpc.remote_base_dir,
                remote_command: raw.hpc.remote_command,
                scp_command: raw.hpc.scp_command,
                ssh_command: raw.hpc.ssh_command,
                pueue_command: raw.hpc.pueue_command,
            },
            engine: EngineConfig {
                sleep_interval: std::time::Duration::from_secs(raw.main_loop.sleep_interval_seconds),
                running_case_timeout: chrono::Duration::hours(raw.main_loop.running_case_timeout_hours),
                dispatch_batch_size: raw.main_loop.parallel_processing.batch_size,
                parallel_enabled: raw.main_loop.parallel_processing.enabled,
                max_workers: raw.main_loop.parallel_processing.max_workers,
                processing_timeout: std::time::Duration::from_secs(300),
                priority_scheduling_enabled: raw.main_loop.priority_scheduling.enabled,
                priority_algorithm: algorithm,
                aging_factor: raw.main_loop.priority_scheduling.aging_factor,
                starvation_threshold_hours: raw.main_loop.priority_scheduling.starvation_threshold_hours,
            },
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
