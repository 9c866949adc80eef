use super::*;
use mqic_core::FakeClock;
use mqic_executor::FakeExecutor;
use mqic_storage::StoreConfig;

fn new_store(dir: &tempfile::TempDir) -> Arc<Store> {
    let config = StoreConfig {
        wal_path: dir.path().join("wal.jsonl"),
        snapshot_path: dir.path().join("snapshot.bin"),
    };
    Arc::new(Store::open(config, Arc::new(FakeClock::new())).expect("open store"))
}

#[tokio::test]
async fn fresh_case_gets_lexicographically_first_available_group() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    store.ensure_gpu_resource_exists("g1").expect("ensure");
    store.ensure_gpu_resource_exists("g0").expect("ensure");
    let case_id = store.add_case(&dir.path().join("c1")).expect("add_case");

    let allocator = GpuAllocator::new(store.clone(), Arc::new(FakeExecutor::new()));
    let group = allocator.allocate(case_id).await;
    assert_eq!(group, Some("g0".to_string()));
}

#[tokio::test]
async fn already_locked_case_is_rebound_without_relocking() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    store.ensure_gpu_resource_exists("g0").expect("ensure");
    let case_id = store.add_case(&dir.path().join("c1")).expect("add_case");
    store
        .find_and_lock_any_available_gpu(case_id)
        .expect("lock")
        .expect("group");

    let allocator = GpuAllocator::new(store.clone(), Arc::new(FakeExecutor::new()));
    let group = allocator.allocate(case_id).await;
    assert_eq!(group, Some("g0".to_string()));
}

#[tokio::test]
async fn exhausted_pool_returns_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    let case_id = store.add_case(&dir.path().join("c1")).expect("add_case");

    let allocator = GpuAllocator::new(store.clone(), Arc::new(FakeExecutor::new()));
    assert_eq!(allocator.allocate(case_id).await, None);
}
