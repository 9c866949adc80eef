// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mqic: the HPC case-dispatcher daemon.
//!
//! Owns the state store, the filesystem scanner, the remote executor,
//! and the reconciliation loop, per §2's single long-lived process
//! model.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;

use mqic_core::SystemClock;
use mqic_daemon::{config::Config, dashboard::Dashboard, lock::InstanceLock, logging, startup};
use mqic_engine::ReconciliationLoop;
use mqic_executor::{SshPueueExecutor, TracedExecutor};
use mqic_scanner::CaseScanner;
use mqic_storage::{Store, StoreConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const LOCK_FILE_NAME: &str = "mqic.lock";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)?;

    logging::rotate_log_if_needed(&config.logging_path);
    let _log_guard = logging::setup_logging(&config.logging_path)?;

    info!("starting mqic daemon");

    let lock_path = lock_path_for(&config.database_path);
    let _instance_lock = match InstanceLock::acquire(&lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            error!("failed to acquire instance lock: {e}");
            return Err(e.into());
        }
    };

    let clock: Arc<dyn mqic_core::Clock> = Arc::new(SystemClock);
    let store_config = StoreConfig {
        wal_path: config.database_path.join("wal.jsonl"),
        snapshot_path: config.database_path.join("snapshot.bin"),
    };
    std::fs::create_dir_all(&config.database_path)?;
    let store = Arc::new(Store::open(store_config, Arc::clone(&clock))?);

    startup::run(&config, &store)?;

    let executor = Arc::new(TracedExecutor::new(SshPueueExecutor::new(config.executor.clone())));

    let scanner = CaseScanner::spawn(
        config.watch_path.clone(),
        config.quiescence_period,
        Arc::clone(&store),
        Arc::clone(&clock),
    )?;

    let dashboard = config.dashboard_auto_start.then(Dashboard::spawn).flatten();

    let reconciler = Arc::new(ReconciliationLoop::new(
        Arc::clone(&store),
        Arc::clone(&executor),
        Arc::clone(&clock),
        config.engine.clone(),
    ));
    let shutdown = reconciler.shutdown_handle();

    spawn_checkpoint_task(Arc::clone(&store));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("daemon ready, watching {}", config.watch_path.display());
    println!("READY");

    let reconcile_handle = {
        let reconciler = Arc::clone(&reconciler);
        tokio::spawn(async move { reconciler.run().await })
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }

    // Scanner stop drains pending timers without firing them (§5); the
    // reconciliation loop finishes its current tick, not its current phase.
    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    let _ = reconcile_handle.await;
    scanner.shutdown();

    if let Some(dashboard) = dashboard {
        dashboard.shutdown().await;
    }

    if let Err(e) = store.checkpoint() {
        error!("failed to checkpoint store on shutdown: {e}");
    }

    info!("daemon stopped");
    Ok(())
}

fn config_path_from_args() -> Result<PathBuf, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(PathBuf::from(path)),
        None => {
            eprintln!("usage: mqic <config.toml>");
            std::process::exit(1);
        }
    }
}

fn lock_path_for(database_path: &std::path::Path) -> PathBuf {
    database_path.join(LOCK_FILE_NAME)
}

const CHECKPOINT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Periodic snapshot so recovery after a crash replays only the WAL tail,
/// not the whole history.
fn spawn_checkpoint_task(store: Arc<Store>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = store.checkpoint() {
                tracing::warn!(error = %e, "periodic checkpoint failed");
            }
        }
    });
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
