use super::*;
use std::path::PathBuf;

#[tokio::test]
async fn submit_then_status_round_trips() {
    let fake = FakeExecutor::new();
    let outcome = fake.submit(&PathBuf::from("/tmp/case"), "gpu0", "mqic_case_1").await;
    let SubmitOutcome::Submitted(task_id) = outcome else {
        panic!("expected Submitted, got {outcome:?}");
    };
    assert_eq!(fake.status(task_id).await, StatusOutcome::Running);
}

#[tokio::test]
async fn find_by_label_locates_submitted_task() {
    let fake = FakeExecutor::new();
    fake.submit(&PathBuf::from("/tmp/case"), "gpu0", "mqic_case_42").await;
    match fake.find_by_label("mqic_case_42").await {
        FindByLabelOutcome::Found(Some(_)) => {}
        other => panic!("expected Found(Some(_)), got {other:?}"),
    }
    assert_eq!(fake.find_by_label("mqic_case_99").await, FindByLabelOutcome::NotFound);
}

#[tokio::test]
async fn unreachable_flag_affects_every_method() {
    let fake = FakeExecutor::new();
    fake.set_unreachable(true);
    assert!(matches!(
        fake.submit(&PathBuf::from("/tmp/case"), "gpu0", "l").await,
        SubmitOutcome::Unreachable(_)
    ));
    assert_eq!(fake.status(1).await, StatusOutcome::Unreachable);
    assert_eq!(fake.find_by_label("l").await, FindByLabelOutcome::Unreachable);
    assert!(fake.list_groups().await.is_err());
}

#[tokio::test]
async fn reject_next_submit_is_consumed_once() {
    let fake = FakeExecutor::new();
    fake.reject_next_submit("quota exceeded");
    let first = fake.submit(&PathBuf::from("/tmp/case"), "gpu0", "l").await;
    assert!(matches!(first, SubmitOutcome::Permanent(_)));
    let second = fake.submit(&PathBuf::from("/tmp/case"), "gpu0", "l").await;
    assert!(matches!(second, SubmitOutcome::Submitted(_)));
}

#[tokio::test]
async fn kill_marks_task_failed() {
    let fake = FakeExecutor::new();
    let SubmitOutcome::Submitted(task_id) = fake.submit(&PathBuf::from("/tmp/case"), "gpu0", "l").await else {
        panic!("expected submission to succeed");
    };
    assert!(fake.kill(task_id).await);
    assert_eq!(fake.status(task_id).await, StatusOutcome::Failure);
    assert!(!fake.kill(999).await);
}
