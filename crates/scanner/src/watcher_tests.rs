use super::*;
use mqic_core::FakeClock;
use mqic_storage::StoreConfig;
use std::fs;

#[test]
fn top_level_dir_ignores_direct_children_of_watch_path() {
    let watch_path = Path::new("/w");
    assert_eq!(top_level_dir(Path::new("/w/loose_file.txt"), watch_path), None);
    assert_eq!(top_level_dir(watch_path, watch_path), None);
}

#[test]
fn top_level_dir_resolves_nested_events_to_their_top_level_ancestor() {
    let watch_path = Path::new("/w");
    assert_eq!(
        top_level_dir(Path::new("/w/c1/inputs/a.txt"), watch_path),
        Some(PathBuf::from("/w/c1"))
    );
    assert_eq!(
        top_level_dir(Path::new("/w/c1"), watch_path),
        None,
        "the directory's own creation event has no deeper component"
    );
}

#[test]
fn top_level_dir_ignores_paths_outside_watch_path() {
    assert_eq!(top_level_dir(Path::new("/elsewhere/a.txt"), Path::new("/w")), None);
}

fn new_store(dir: &tempfile::TempDir) -> Store {
    let config = StoreConfig {
        wal_path: dir.path().join("wal.jsonl"),
        snapshot_path: dir.path().join("snapshot.bin"),
    };
    Store::open(config, Arc::new(FakeClock::new())).expect("open store")
}

#[test]
fn process_fired_admits_case_once_and_is_idempotent_on_repeat_fire() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    let case_dir = dir.path().join("c1");
    fs::create_dir(&case_dir).expect("mkdir");

    let mut timers = TimerMap::new();
    let mut retries = HashMap::new();
    let clock = FakeClock::new();

    process_fired(&case_dir, &store, &mut timers, &mut retries, &clock);
    assert!(store.get_case_by_path(&case_dir).is_some());

    // A second fire (e.g. a stray timer re-add) must not re-insert or error.
    process_fired(&case_dir, &store, &mut timers, &mut retries, &clock);
    assert!(!timers.has_timers());
}

#[test]
fn process_fired_silently_drops_a_directory_deleted_before_fire() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    let missing = dir.path().join("never_existed");

    let mut timers = TimerMap::new();
    let mut retries = HashMap::new();
    let clock = FakeClock::new();

    process_fired(&missing, &store, &mut timers, &mut retries, &clock);
    assert!(store.get_case_by_path(&missing).is_none());
    assert!(!timers.has_timers());
}
