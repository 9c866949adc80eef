// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The filesystem watcher thread and quiescence-fire handling (§4.3).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use chrono::Duration;
use mqic_core::Clock;
use mqic_storage::Store;
use notify::{RecursiveMode, Watcher};

use crate::error::ScannerError;
use crate::timers::TimerMap;

const POLL_INTERVAL: StdDuration = StdDuration::from_millis(250);
const MAX_RETRIES: u32 = 1;
const RETRY_DELAY: Duration = Duration::seconds(1);

/// Owns the background thread driving C3. Dropping or calling
/// [`CaseScanner::shutdown`] stops the watcher; pending timers are drained
/// without firing, per §5's cancellation contract.
pub struct CaseScanner {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaseScanner {
    pub fn spawn(
        watch_path: PathBuf,
        quiescence_period: Duration,
        store: Arc<Store>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ScannerError> {
        let (tx, rx) = std_mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(|e| ScannerError::Watch(e.to_string()))?;
        watcher
            .watch(&watch_path, RecursiveMode::Recursive)
            .map_err(|e| ScannerError::Watch(e.to_string()))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_for_thread = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || {
            let _watcher = watcher; // keep alive for the thread's lifetime
            run_loop(rx, &watch_path, quiescence_period, store.as_ref(), clock.as_ref(), &shutdown_for_thread);
        });

        Ok(Self { shutdown, handle: Some(handle) })
    }

    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaseScanner {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_loop(
    rx: std_mpsc::Receiver<notify::Result<notify::Event>>,
    watch_path: &Path,
    quiescence_period: Duration,
    store: &Store,
    clock: &dyn Clock,
    shutdown: &AtomicBool,
) {
    let mut timers = TimerMap::new();
    let mut retry_counts: HashMap<PathBuf, u32> = HashMap::new();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            timers.drain();
            return;
        }

        while let Ok(res) = rx.try_recv() {
            match res {
                Ok(event) => handle_event(&event, watch_path, &mut timers, quiescence_period, clock),
                Err(e) => tracing::warn!(error = %e, "scanner watch error"),
            }
        }

        let now = clock.now();
        for dir in timers.fired(now) {
            process_fired(&dir, store, &mut timers, &mut retry_counts, clock);
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

fn handle_event(
    event: &notify::Event,
    watch_path: &Path,
    timers: &mut TimerMap,
    quiescence_period: Duration,
    clock: &dyn Clock,
) {
    for path in &event.paths {
        let Some(top_level) = top_level_dir(path, watch_path) else {
            continue;
        };
        timers.reset(top_level, quiescence_period, clock.now());
    }
}

/// The top-level directory under `watch_path` that `path` lives inside,
/// or `None` if `path` is a direct child of `watch_path` (ignored per
/// §4.3) or lies outside `watch_path` entirely.
fn top_level_dir(path: &Path, watch_path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(watch_path).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    components.next()?;
    Some(watch_path.join(first))
}

fn process_fired(
    dir: &Path,
    store: &Store,
    timers: &mut TimerMap,
    retry_counts: &mut HashMap<PathBuf, u32>,
    clock: &dyn Clock,
) {
    if !dir.exists() {
        retry_counts.remove(dir);
        return;
    }
    if store.get_case_by_path(dir).is_some() {
        retry_counts.remove(dir);
        return;
    }
    match store.add_case(dir) {
        Ok(case_id) => {
            tracing::info!(?dir, case_id = case_id.value(), "case admitted after quiescence");
            retry_counts.remove(dir);
        }
        Err(e) => {
            let attempts = retry_counts.entry(dir.to_path_buf()).or_insert(0);
            *attempts += 1;
            if *attempts <= MAX_RETRIES {
                tracing::warn!(?dir, error = %e, "add_case failed, scheduling one retry");
                timers.reset(dir.to_path_buf(), RETRY_DELAY, clock.now());
            } else {
                tracing::error!(?dir, error = %e, "add_case failed after retry, dropping");
                retry_counts.remove(dir);
            }
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
