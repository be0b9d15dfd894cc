use super::*;
use crate::application::ports::repositories::LocalRepository;
use crate::application::shared::tests::fixtures::{customer, test_sync_config, SyncHarness};
use crate::application::shared::tests::mocks::RemoteFailure;
use crate::domain::entities::Customer;
use crate::domain::value_objects::CloudSyncStatus;
use std::sync::atomic::Ordering as AtomicOrdering;

#[tokio::test]
async fn enqueue_then_clear_touches_nothing_remote() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    let removed = h.queue.clear_queue().await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(h.remote.total_calls(), 0);
    assert!(h.queue.pending_operations().await.unwrap().is_empty());
}

#[tokio::test]
async fn enqueue_keeps_one_pending_operation_per_entity() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();

    let pending = h.queue.pending_operations().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].op_type, OperationType::Upload);
}

#[tokio::test]
async fn pending_delete_is_never_downgraded() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    h.queue
        .enqueue(
            OperationType::Delete,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();

    let pending = h.queue.pending_operations().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].op_type, OperationType::Delete);
}

#[tokio::test]
async fn drain_applies_operations_and_restores_online_state() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.queue.set_online(false);

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    let outcome = h.queue.process_pending_queue().await.unwrap();

    assert_eq!(outcome.succeeded, 1);
    assert!(h.queue.is_online());
    assert!(h.remote.row(record.id).is_some());
    assert!(h.queue.pending_operations().await.unwrap().is_empty());
}

#[tokio::test]
async fn exhausted_retries_park_operation_and_mark_record() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Connectivity));

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();

    // max_retry is 3 with zero backoff: three drains bump the retry count,
    // the fourth parks the operation.
    for _ in 0..3 {
        let outcome = h.queue.process_pending_queue().await.unwrap();
        assert_eq!(outcome.retried, 1);
    }
    let outcome = h.queue.process_pending_queue().await.unwrap();
    assert_eq!(outcome.failed, 1);
    assert!(!h.queue.is_online());

    let counts = h.queue.counts().await.unwrap();
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.failed, 1);
    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert_eq!(stored.unwrap().sync_status, CloudSyncStatus::Failed);

    // Recovery does not resurrect parked operations.
    h.remote.set_failure(None);
    let outcome = h.queue.process_pending_queue().await.unwrap();
    assert_eq!(outcome.succeeded, 0);
    let all = h.queue.all_operations().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].last_error.is_some());
}

#[tokio::test]
async fn terminal_failure_parks_without_consuming_retries() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Validation));

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    let outcome = h.queue.process_pending_queue().await.unwrap();

    assert_eq!(outcome.failed, 1);
    assert_eq!(h.remote.upsert_calls.load(AtomicOrdering::SeqCst), 1);
    let counts = h.queue.counts().await.unwrap();
    assert_eq!(counts.failed, 1);
}

#[tokio::test]
async fn backoff_window_skips_operations_until_elapsed() {
    let config = SyncConfig {
        backoff_base_secs: 3600,
        ..test_sync_config()
    };
    let h = SyncHarness::<Customer>::with_config(config).await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Connectivity));

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            record.id,
            h.shop_id,
        )
        .await
        .unwrap();
    let outcome = h.queue.process_pending_queue().await.unwrap();
    assert_eq!(outcome.retried, 1);

    // The remote recovered, but the operation waits out its backoff window.
    h.remote.set_failure(None);
    let outcome = h.queue.process_pending_queue().await.unwrap();
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.succeeded, 0);
    assert_eq!(h.remote.upsert_calls.load(AtomicOrdering::SeqCst), 1);
}

#[tokio::test]
async fn missing_local_record_parks_queued_upload() {
    let h = SyncHarness::<Customer>::new().await;

    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Customer,
            Uuid::new_v4(),
            h.shop_id,
        )
        .await
        .unwrap();
    let outcome = h.queue.process_pending_queue().await.unwrap();

    assert_eq!(outcome.failed, 1);
    assert_eq!(h.remote.total_calls(), 0);
}

#[tokio::test]
async fn unregistered_entity_type_is_parked() {
    let h = SyncHarness::<Customer>::new().await;

    // Only the customer handler is registered in this harness.
    h.queue
        .enqueue(
            OperationType::Upload,
            EntityType::Employee,
            Uuid::new_v4(),
            h.shop_id,
        )
        .await
        .unwrap();
    let outcome = h.queue.process_pending_queue().await.unwrap();

    assert_eq!(outcome.failed, 1);
    let all = h.queue.all_operations().await.unwrap();
    assert_eq!(all[0].last_error.as_deref(), Some("no handler registered for entity type"));
}
