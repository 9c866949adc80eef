use super::*;
use mqic_core::{CaseStatus, FakeClock};
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
async fn dispatch_batch_submits_every_case_concurrently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    store.ensure_gpu_resource_exists("g0").expect("ensure");
    store.ensure_gpu_resource_exists("g1").expect("ensure");
    let c1 = store.add_case(&dir.path().join("c1")).expect("add_case");
    let c2 = store.add_case(&dir.path().join("c2")).expect("add_case");

    let executor = Arc::new(FakeExecutor::new());
    let dispatcher = ParallelDispatcher::new(store.clone(), executor, 4, Duration::from_secs(5));

    let cases = vec![store.get_case_by_id(c1).unwrap(), store.get_case_by_id(c2).unwrap()];
    dispatcher.dispatch_batch(cases).await;

    assert_eq!(store.get_case_by_id(c1).unwrap().status, CaseStatus::Running);
    assert_eq!(store.get_case_by_id(c2).unwrap().status, CaseStatus::Running);
    assert_eq!(dispatcher.metrics.total.load(Ordering::Relaxed), 2);
    assert_eq!(dispatcher.metrics.successful.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn dispatch_batch_deduplicates_a_case_listed_twice() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    store.ensure_gpu_resource_exists("g0").expect("ensure");
    let c1 = store.add_case(&dir.path().join("c1")).expect("add_case");

    let executor = Arc::new(FakeExecutor::new());
    let dispatcher = ParallelDispatcher::new(store.clone(), executor.clone(), 4, Duration::from_secs(5));

    let case = store.get_case_by_id(c1).unwrap();
    dispatcher.dispatch_batch(vec![case.clone(), case]).await;

    assert_eq!(executor.submitted_count(), 1, "the duplicate entry must not be submitted twice");
}

#[tokio::test]
async fn dispatch_batch_leaves_case_submitted_when_pool_exhausted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = new_store(&dir);
    let c1 = store.add_case(&dir.path().join("c1")).expect("add_case");

    let executor = Arc::new(FakeExecutor::new());
    let dispatcher = ParallelDispatcher::new(store.clone(), executor, 4, Duration::from_secs(5));

    let case = store.get_case_by_id(c1).unwrap();
    dispatcher.dispatch_batch(vec![case]).await;

    assert_eq!(store.get_case_by_id(c1).unwrap().status, CaseStatus::Submitted);
}
