use super::*;
use crate::application::ports::session::FixedSessionProvider;
use crate::application::services::offline_queue::OfflineQueue;
use crate::application::shared::tests::fixtures::{
    customer, memory_pool, test_sync_config, ticket, SyncHarness,
};
use crate::application::shared::tests::mocks::{MockRemoteTable, RemoteFailure};
use crate::domain::entities::{Customer, Ticket};
use crate::domain::value_objects::{EntityType, Role};
use crate::infrastructure::database::{SqliteLocalStore, SqliteQueueStore, SqliteSyncStateStore};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn upload_marks_record_synced() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();

    h.syncer.upload(&record).await.unwrap();

    assert_eq!(h.remote.upsert_calls.load(Ordering::SeqCst), 1);
    assert!(h.remote.row(record.id).is_some());
    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert_eq!(stored.unwrap().sync_status, CloudSyncStatus::Synced);
}

#[tokio::test]
async fn upload_queues_when_remote_unreachable() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Connectivity));

    // Connectivity failures never surface to the caller.
    h.syncer.upload(&record).await.unwrap();

    assert!(!h.queue.is_online());
    let pending = h.queue.pending_operations().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].op_type, OperationType::Upload);
    assert_eq!(pending[0].entity_id, record.id);
    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert_eq!(stored.unwrap().sync_status, CloudSyncStatus::Pending);

    // Once the remote recovers a drain completes the original edit.
    h.remote.set_failure(None);
    let outcome = h.queue.process_pending_queue().await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert!(h.queue.is_online());
    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert_eq!(stored.unwrap().sync_status, CloudSyncStatus::Synced);
    assert!(h.remote.row(record.id).is_some());
}

#[tokio::test]
async fn upload_terminal_failure_marks_record_failed() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Validation));

    let err = h.syncer.upload(&record).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert_eq!(stored.unwrap().sync_status, CloudSyncStatus::Failed);
    assert!(h.queue.pending_operations().await.unwrap().is_empty());
}

#[tokio::test]
async fn tenant_guard_blocks_before_any_network_call() {
    let h = SyncHarness::<Customer>::new().await;
    let foreign = customer(crate::domain::value_objects::ShopId::generate());

    let err = h.syncer.upload(&foreign).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
    assert_eq!(h.remote.total_calls(), 0);
    assert!(h.queue.pending_operations().await.unwrap().is_empty());
}

#[tokio::test]
async fn download_merges_remote_rows_and_advances_watermark() {
    let h = SyncHarness::<Customer>::new().await;
    let first = customer(h.shop_id);
    // Local copy at version 1; another device pushed version 2 since.
    h.local.save(&first).await.unwrap();
    let mut newer = first.clone();
    newer.sync_version = 2;
    newer.phone = Some("555-0199".to_string());
    let second = customer(h.shop_id);
    let foreign = customer(crate::domain::value_objects::ShopId::generate());
    h.remote
        .seed(vec![newer.clone(), second.clone(), foreign.clone()]);

    let changed = h.syncer.download().await.unwrap();
    assert_eq!(changed, 2);

    let stored: Option<Customer> = h.local.get(first.id).await.unwrap();
    let stored = stored.unwrap();
    assert_eq!(stored.sync_version, 2);
    assert_eq!(stored.phone.as_deref(), Some("555-0199"));
    assert_eq!(stored.sync_status, CloudSyncStatus::Synced);
    let other_tenant: Option<Customer> = h.local.get(foreign.id).await.unwrap();
    assert!(other_tenant.is_none());

    // Nothing newer than the watermark: the second pull is a no-op.
    let changed = h.syncer.download().await.unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn merge_is_last_writer_wins_in_either_order() {
    let base = customer(crate::domain::value_objects::ShopId::generate());
    let mut older = base.clone();
    older.sync_version = 2;
    older.notes = Some("older edit".to_string());
    let mut newer = base.clone();
    newer.sync_version = 3;
    newer.notes = Some("newer edit".to_string());

    for (a, b) in [(older.clone(), newer.clone()), (newer.clone(), older.clone())] {
        let h = SyncHarness::<Customer>::for_shop(base.shop_id, test_sync_config()).await;
        h.syncer.merge_or_create(a).await.unwrap();
        let outcome = h.syncer.merge_or_create(b).await.unwrap();
        assert!(matches!(
            outcome,
            MergeOutcome::Updated | MergeOutcome::DiscardedOlder
        ));

        let stored: Option<Customer> = h.local.get(base.id).await.unwrap();
        let stored = stored.unwrap();
        assert_eq!(stored.sync_version, 3);
        assert_eq!(stored.notes.as_deref(), Some("newer edit"));
    }
}

#[tokio::test]
async fn merge_with_equal_version_is_unchanged() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.syncer.merge_or_create(record.clone()).await.unwrap();

    let outcome = h.syncer.merge_or_create(record).await.unwrap();
    assert_eq!(outcome, MergeOutcome::Unchanged);
}

#[tokio::test]
async fn delete_tombstones_locally_and_propagates() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.syncer.upload(&record).await.unwrap();

    h.syncer.delete(&record).await.unwrap();

    assert_eq!(h.remote.delete_calls.load(Ordering::SeqCst), 1);
    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    let stored = stored.unwrap();
    assert!(stored.deleted_at.is_some());
    assert_eq!(stored.sync_status, CloudSyncStatus::Synced);

    // Tombstones are hidden from the default listing but not gone.
    let visible: Vec<Customer> = h.local.list(&h.shop_id).await.unwrap();
    assert!(visible.is_empty());
    let all: Vec<Customer> = h.local.list_all(&h.shop_id).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn delete_while_offline_queues_the_removal() {
    let h = SyncHarness::<Customer>::new().await;
    let record = customer(h.shop_id);
    h.local.save(&record).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Connectivity));

    h.syncer.delete(&record).await.unwrap();

    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert!(stored.unwrap().deleted_at.is_some());
    let pending = h.queue.pending_operations().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].op_type, OperationType::Delete);
}

#[tokio::test]
async fn batch_upload_chunks_by_configured_size() {
    let h = SyncHarness::<Customer>::new().await;
    let records: Vec<Customer> = (0..5).map(|_| customer(h.shop_id)).collect();
    h.local.save_all(&records).await.unwrap();

    let outcome = h.syncer.batch_upload(&records, true).await.unwrap();

    assert_eq!(outcome.uploaded, 5);
    assert_eq!(outcome.queued, 0);
    assert_eq!(outcome.failed, 0);
    // batch_size 2 splits five records into three chunks.
    assert_eq!(h.remote.batch_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.remote.row_count(), 5);
    let synced: Vec<Customer> = h
        .local
        .list_with_status(&h.shop_id, CloudSyncStatus::Synced)
        .await
        .unwrap();
    assert_eq!(synced.len(), 5);
}

#[tokio::test]
async fn batch_upload_offline_queues_everything() {
    let h = SyncHarness::<Customer>::new().await;
    let records: Vec<Customer> = (0..5).map(|_| customer(h.shop_id)).collect();
    h.local.save_all(&records).await.unwrap();
    h.remote.set_failure(Some(RemoteFailure::Connectivity));

    let outcome = h.syncer.batch_upload(&records, false).await.unwrap();

    assert_eq!(outcome.uploaded, 0);
    assert_eq!(outcome.queued, 5);
    // First chunk failed, the rest were queued without further attempts.
    assert_eq!(h.remote.batch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.queue.pending_operations().await.unwrap().len(), 5);
}

#[tokio::test]
async fn realtime_feed_applies_upserts_and_tombstones() {
    let h = SyncHarness::<Customer>::new().await;
    h.syncer.start_realtime().await.unwrap();

    let record = customer(h.shop_id);
    h.remote
        .push_change(RemoteChange::Upsert(record.clone()));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert_eq!(stored.unwrap().sync_status, CloudSyncStatus::Synced);

    h.remote.push_change(RemoteChange::Delete {
        id: record.id,
        deleted_at: Utc::now(),
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let stored: Option<Customer> = h.local.get(record.id).await.unwrap();
    assert!(stored.unwrap().deleted_at.is_some());

    h.syncer.stop_realtime().await;
    // Idempotent stop.
    h.syncer.stop_realtime().await;
}

/// Customer and ticket syncers sharing one store, with the ticket syncer
/// depending on the customer syncer.
struct ParentChildHarness {
    local: Arc<SqliteLocalStore>,
    queue: Arc<OfflineQueue>,
    customer_remote: Arc<MockRemoteTable<Customer>>,
    ticket_remote: Arc<MockRemoteTable<Ticket>>,
    tickets: Arc<EntitySyncer<Ticket>>,
    shop_id: crate::domain::value_objects::ShopId,
}

async fn parent_child_harness() -> ParentChildHarness {
    let pool = memory_pool().await;
    let local = Arc::new(SqliteLocalStore::new(pool.get_pool().clone()));
    let queue_store = Arc::new(SqliteQueueStore::new(pool.get_pool().clone()));
    let sync_state = Arc::new(SqliteSyncStateStore::new(pool.get_pool().clone()));
    let shop_id = crate::domain::value_objects::ShopId::generate();
    let session: Arc<dyn SessionProvider> =
        Arc::new(FixedSessionProvider::new(shop_id, Role::Admin));
    let config = test_sync_config();
    let queue = Arc::new(OfflineQueue::new(queue_store, config.clone()));

    let customer_remote = Arc::new(MockRemoteTable::<Customer>::new());
    let ticket_remote = Arc::new(MockRemoteTable::<Ticket>::new());
    let customers = Arc::new(EntitySyncer::<Customer>::new(
        local.clone(),
        customer_remote.clone(),
        session.clone(),
        queue.clone(),
        sync_state.clone(),
        config.clone(),
        None,
    ));
    let tickets = Arc::new(EntitySyncer::<Ticket>::new(
        local.clone(),
        ticket_remote.clone(),
        session,
        queue.clone(),
        sync_state,
        config,
        Some(customers.clone()),
    ));
    queue
        .register_handler(EntityType::Customer, customers.clone())
        .await;
    queue.register_handler(EntityType::Ticket, tickets.clone()).await;

    ParentChildHarness {
        local,
        queue,
        customer_remote,
        ticket_remote,
        tickets,
        shop_id,
    }
}

#[tokio::test]
async fn child_upload_pushes_unsynced_parent_first() {
    let h = parent_child_harness().await;
    let parent = customer(h.shop_id);
    h.local.save(&parent).await.unwrap();
    let child = ticket(h.shop_id, parent.id, 1001);
    h.local.save(&child).await.unwrap();

    h.tickets.upload(&child).await.unwrap();

    assert!(h.customer_remote.row(parent.id).is_some());
    assert!(h.ticket_remote.row(child.id).is_some());
    let stored_parent: Option<Customer> = h.local.get(parent.id).await.unwrap();
    assert_eq!(stored_parent.unwrap().sync_status, CloudSyncStatus::Synced);
}

#[tokio::test]
async fn child_never_lands_remotely_before_its_parent() {
    let h = parent_child_harness().await;
    let parent = customer(h.shop_id);
    h.local.save(&parent).await.unwrap();
    let child = ticket(h.shop_id, parent.id, 1002);
    h.local.save(&child).await.unwrap();

    // Parent table unreachable, ticket table fine: the child upload must not
    // proceed past the failed parent push.
    h.customer_remote
        .set_failure(Some(RemoteFailure::Connectivity));
    h.tickets.upload(&child).await.unwrap();

    assert_eq!(h.ticket_remote.total_calls(), 0);
    let pending = h.queue.pending_operations().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].entity_type, EntityType::Ticket);
    assert_eq!(pending[0].entity_id, child.id);

    // Replaying the queued edit re-attempts the parent first.
    h.customer_remote.set_failure(None);
    let outcome = h.queue.process_pending_queue().await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert!(h.customer_remote.row(parent.id).is_some());
    assert!(h.ticket_remote.row(child.id).is_some());
    let stored_parent: Option<Customer> = h.local.get(parent.id).await.unwrap();
    assert_eq!(stored_parent.unwrap().sync_status, CloudSyncStatus::Synced);
}
