// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration tests: the `mqic` binary's startup
//! contract (§6 config validation, §10.5 single-instance enforcement)
//! exercised as a real subprocess, plus the full C1/C2/C6 stack wired
//! together exactly as `main.rs` wires it, covering §8's seed scenarios
//! end-to-end rather than one component at a time.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use mqic_core::{CaseStatus, Clock, FakeClock, GpuStatus};
use mqic_engine::{EngineConfig, ReconciliationLoop};
use mqic_executor::FakeExecutor;
use mqic_storage::{Store, StoreConfig};
use serial_test::serial;

fn minimal_config_toml(dir: &std::path::Path) -> String {
    format!(
        r#"
[database]
path = "{db}"

[scanner]
watch_path = "{watch}"

[pueue]
groups = ["g0", "g1"]

[hpc]
host = "cluster.example.com"
user = "mqic"
remote_base_dir = "/scratch/mqic"
remote_command = "python interpreter.py && python moquisim.py"
"#,
        db = dir.join("store").display(),
        watch = dir.join("incoming").display(),
    )
}

#[test]
#[serial]
fn binary_rejects_a_config_file_missing_required_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("mqic.toml");
    std::fs::write(&config_path, "[database]\npath = \"/tmp/x\"\n").expect("write config");

    let mut cmd = Command::cargo_bin("mqic").expect("binary builds");
    cmd.arg(&config_path)
        .assert()
        .failure();
}

#[test]
#[serial]
fn binary_requires_a_config_path_argument() {
    let mut cmd = Command::cargo_bin("mqic").expect("binary builds");
    cmd.assert().failure();
}

#[test]
#[serial]
fn second_instance_refuses_to_start_while_first_holds_the_lock() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("mqic.toml");
    let mut config_file = std::fs::File::create(&config_path).expect("create config");
    config_file
        .write_all(minimal_config_toml(dir.path()).as_bytes())
        .expect("write config");

    let mut first = Command::cargo_bin("mqic")
        .expect("binary builds")
        .arg(&config_path)
        .spawn()
        .expect("spawn first instance");

    // Give the first instance time to acquire the lock and print READY.
    std::thread::sleep(Duration::from_millis(500));

    let mut second = Command::cargo_bin("mqic").expect("binary builds");
    second.arg(&config_path).assert().failure();

    let _ = first.kill();
    let _ = first.wait();
}

fn new_store(dir: &tempfile::TempDir, clock: &Arc<FakeClock>) -> Arc<Store> {
    let config = StoreConfig {
        wal_path: dir.path().join("wal.jsonl"),
        snapshot_path: dir.path().join("snapshot.bin"),
    };
    Arc::new(Store::open(config, clock.clone() as Arc<dyn Clock>).expect("open store"))
}

/// Seed scenario 1 (§8): happy path across three ticks of the full
/// C1+C2+C6 stack, wired exactly as `main.rs` wires it (minus the
/// scanner and daemon process concerns, which have their own coverage).
#[tokio::test]
async fn seed_scenario_happy_path_through_the_real_reconciliation_loop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FakeClock::new());
    let store = new_store(&dir, &clock);
    store.ensure_gpu_resource_exists("g0").expect("ensure g0");
    store.ensure_gpu_resource_exists("g1").expect("ensure g1");

    let case_id = store.add_case(&dir.path().join("c1")).expect("add_case");

    let executor = Arc::new(FakeExecutor::new());
    let reconciler = ReconciliationLoop::new(
        store.clone(),
        executor.clone(),
        clock.clone() as Arc<dyn Clock>,
        EngineConfig::default(),
    );

    reconciler.tick().await;
    let case = store.get_case_by_id(case_id).expect("case exists");
    assert_eq!(case.status, CaseStatus::Running);
    assert_eq!(case.pueue_group.as_deref(), Some("g0"), "lexicographic tie-break picks g0");
    let task_id = case.pueue_task_id.expect("task id recorded");

    reconciler.tick().await;
    assert_eq!(store.get_case_by_id(case_id).unwrap().status, CaseStatus::Running);

    executor.set_status(task_id, mqic_executor::StatusOutcome::Success);
    reconciler.tick().await;
    let case = store.get_case_by_id(case_id).unwrap();
    assert_eq!(case.status, CaseStatus::Completed);
    assert_eq!(case.progress, 100);
    assert_eq!(store.get_resources_by_status(GpuStatus::Available).len(), 2);
}

/// Seed scenario 3 (§8): a case times out with no corresponding task ever
/// known to the remote (kill fails, so the resource zombies); a second,
/// independently-tracked case then demonstrates the companion recovery
/// path — a kill that succeeds clears a zombie resource.
#[tokio::test]
async fn seed_scenario_timeout_then_zombie_recovery_through_the_real_loop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(FakeClock::new());
    let store = new_store(&dir, &clock);
    store.ensure_gpu_resource_exists("g0").expect("ensure g0");

    let case_id = store.add_case(&dir.path().join("c1")).expect("add_case");
    store.find_and_lock_any_available_gpu(case_id).expect("lock").expect("group available");
    store.update_case_pueue_group(case_id, "g0").expect("set group");
    store.update_case_status(case_id, CaseStatus::Submitting, 10).expect("mark submitting");
    store.update_case_pueue_task_id(case_id, 999).expect("set task id unknown to the remote");
    store.update_case_status(case_id, CaseStatus::Running, 30).expect("mark running");

    let executor = Arc::new(FakeExecutor::new());
    let reconciler = ReconciliationLoop::new(
        store.clone(),
        executor.clone(),
        clock.clone() as Arc<dyn Clock>,
        EngineConfig::default(),
    );

    clock.advance(chrono::Duration::hours(25));
    reconciler.tick().await; // timeout: kill(999) fails, never submitted through the fake

    let case = store.get_case_by_id(case_id).unwrap();
    assert_eq!(case.status, CaseStatus::Failed);
    assert_eq!(store.get_resources_by_status(GpuStatus::Zombie).len(), 1);

    // Now make the remote recognize the task (as if an operator manually
    // registered it), so the next tick's Phase C kill succeeds.
    let real_task_id = match executor.submit(&dir.path().join("c1"), "g0", "mqic_case_recovery").await {
        mqic_executor::SubmitOutcome::Submitted(id) => id,
        other => panic!("expected Submitted, got {other:?}"),
    };
    store.update_case_pueue_task_id(case_id, real_task_id).expect("rebind to a known task");

    reconciler.tick().await; // Phase C: kill(real_task_id) succeeds, zombie clears
    assert_eq!(store.get_resources_by_status(GpuStatus::Zombie).len(), 0);
    assert_eq!(store.get_resources_by_status(GpuStatus::Available).len(), 1);
}
