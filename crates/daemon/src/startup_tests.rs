use super::*;
use mqic_core::{FakeClock, GpuStatus};
use mqic_storage::StoreConfig;
use std::sync::Arc;

fn minimal_config(dir: &tempfile::TempDir) -> Config {
    let text = format!(
        r#"
[database]
path = "{db}"

[scanner]
watch_path = "{watch}"

[pueue]
groups = ["gpu0"]

[hpc]
host = "cluster.example.com"
user = "mqic"
remote_base_dir = "/scratch/mqic"
remote_command = "run"
"#,
        db = dir.path().join("store").display(),
        watch = dir.path().join("incoming").display(),
    );
    Config::parse(&text).expect("config parses")
}

#[test]
fn creates_watch_path_and_registers_groups() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = minimal_config(&dir);
    let store_config = StoreConfig {
        wal_path: dir.path().join("wal.jsonl"),
        snapshot_path: dir.path().join("snapshot.bin"),
    };
    let store = Store::open(store_config, Arc::new(FakeClock::new())).expect("open store");

    run(&config, &store).expect("startup succeeds");

    assert!(config.watch_path.is_dir());
    assert_eq!(store.get_resources_by_status(GpuStatus::Available).len(), 1);
}

#[test]
fn is_idempotent_across_restarts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = minimal_config(&dir);
    let store_config = StoreConfig {
        wal_path: dir.path().join("wal.jsonl"),
        snapshot_path: dir.path().join("snapshot.bin"),
    };
    let store = Store::open(store_config, Arc::new(FakeClock::new())).expect("open store");

    run(&config, &store).expect("first startup");
    run(&config, &store).expect("second startup must not fail or duplicate resources");

    assert_eq!(store.get_resources_by_status(GpuStatus::Available).len(), 1);
}
