use crate::application::ports::offline_store::WatermarkStore;
use crate::application::ports::remote_client::{RemoteChange, RemoteTable};
use crate::application::ports::repositories::LocalRepository;
use crate::application::ports::session::SessionProvider;
use crate::application::services::offline_queue::{OfflineQueue, OperationHandler};
use crate::domain::entities::SyncOperation;
use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::{CloudSyncStatus, OperationType};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// Lets a child syncer push an unsynced parent record first (Ticket before
/// its Customer would dangle remotely). One hop deep in this domain.
#[async_trait]
pub trait DependencyUploader: Send + Sync {
    async fn ensure_uploaded(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
    Unchanged,
    /// The remote write carried a lower version than the local record; local
    /// wins and re-uploads on the next push cycle.
    DiscardedOlder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub uploaded: u64,
    pub queued: u64,
    pub failed: u64,
}

struct RealtimeHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Bidirectional reconciliation of one entity type between the local store
/// and the remote. One instance per entity type; instances for different
/// types may run concurrently since they touch disjoint tables.
pub struct EntitySyncer<E: SyncRecord> {
    local: Arc<dyn LocalRepository<E>>,
    remote: Arc<dyn RemoteTable<E>>,
    session: Arc<dyn SessionProvider>,
    queue: Arc<OfflineQueue>,
    watermarks: Arc<dyn WatermarkStore>,
    config: SyncConfig,
    dependency: Option<Arc<dyn DependencyUploader>>,
    realtime: Mutex<Option<RealtimeHandle>>,
}

impl<E: SyncRecord> EntitySyncer<E> {
    pub fn new(
        local: Arc<dyn LocalRepository<E>>,
        remote: Arc<dyn RemoteTable<E>>,
        session: Arc<dyn SessionProvider>,
        queue: Arc<OfflineQueue>,
        watermarks: Arc<dyn WatermarkStore>,
        config: SyncConfig,
        dependency: Option<Arc<dyn DependencyUploader>>,
    ) -> Self {
        Self {
            local,
            remote,
            session,
            queue,
            watermarks,
            config,
            dependency,
            realtime: Mutex::new(None),
        }
    }

    pub fn local(&self) -> &Arc<dyn LocalRepository<E>> {
        &self.local
    }

    /// Tenant guard. Must run before any network traffic.
    fn guard_tenant(&self, record: &E) -> Result<(), AppError> {
        let session = self
            .session
            .current_session()
            .ok_or_else(|| AppError::PermissionDenied("no active session".to_string()))?;
        if record.shop_id() != session.shop_id {
            return Err(AppError::PermissionDenied(format!(
                "record belongs to shop {} but session is scoped to {}",
                record.shop_id(),
                session.shop_id
            )));
        }
        Ok(())
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(Duration::from_secs(self.config.request_timeout_secs), fut).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Connectivity("remote call timed out".to_string())),
        }
    }

    /// Push one record. Connectivity failures are swallowed into a queued
    /// operation (the caller is not blocked); authorization and validation
    /// failures surface as errors and mark the record Failed.
    pub async fn upload(&self, record: &E) -> Result<(), AppError> {
        match self.upload_direct(record).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_retryable() => {
                tracing::info!(
                    entity_type = %E::ENTITY_TYPE,
                    entity_id = %record.id(),
                    "remote unreachable, queueing upload: {err}"
                );
                self.queue.set_online(false);
                self.queue
                    .enqueue(
                        OperationType::Upload,
                        E::ENTITY_TYPE,
                        record.id(),
                        record.shop_id(),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Push one record, propagating connectivity errors instead of queueing.
    /// Used by the queue handler and the migration orchestrator, which have
    /// their own retry/pause semantics.
    pub async fn upload_direct(&self, record: &E) -> Result<(), AppError> {
        self.guard_tenant(record)?;

        if let (Some(dep), Some(parent)) = (&self.dependency, record.parent_ref()) {
            dep.ensure_uploaded(parent.id).await?;
        }

        match self.with_timeout(self.remote.upsert(record)).await {
            Ok(()) => {
                self.queue.set_online(true);
                let mut synced = record.clone();
                synced.set_sync_status(CloudSyncStatus::Synced);
                self.local.save(&synced).await?;
                Ok(())
            }
            Err(err) if err.is_retryable() => Err(err),
            Err(err) => {
                let mut failed = record.clone();
                failed.set_sync_status(CloudSyncStatus::Failed);
                self.local.save(&failed).await?;
                Err(err)
            }
        }
    }

    /// Soft-delete locally and propagate the removal. Connectivity failures
    /// queue a delete operation.
    pub async fn delete(&self, record: &E) -> Result<(), AppError> {
        self.guard_tenant(record)?;

        let mut tombstoned = record.clone();
        tombstoned.mark_deleted();
        self.local.save(&tombstoned).await?;

        match self
            .with_timeout(self.remote.delete(&record.shop_id(), record.id()))
            .await
        {
            Ok(()) => {
                self.queue.set_online(true);
                tombstoned.set_sync_status(CloudSyncStatus::Synced);
                self.local.save(&tombstoned).await?;
                Ok(())
            }
            Err(err) if err.is_retryable() => {
                self.queue.set_online(false);
                self.queue
                    .enqueue(
                        OperationType::Delete,
                        E::ENTITY_TYPE,
                        record.id(),
                        record.shop_id(),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Pull remote rows updated since the persisted watermark and merge them.
    /// Returns the number of records that changed locally.
    pub async fn download(&self) -> Result<u32, AppError> {
        let session = self
            .session
            .current_session()
            .ok_or_else(|| AppError::PermissionDenied("no active session".to_string()))?;

        let since = self.watermarks.get(E::ENTITY_TYPE).await?;
        let rows = match self
            .with_timeout(self.remote.select_updated_since(&session.shop_id, since))
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                if err.is_retryable() {
                    self.queue.set_online(false);
                }
                return Err(err);
            }
        };
        self.queue.set_online(true);

        let mut changed = 0u32;
        let mut high_water: Option<DateTime<Utc>> = since;
        for row in rows {
            let row_updated = row.updated_at();
            match self.merge_or_create(row).await? {
                MergeOutcome::Created | MergeOutcome::Updated => changed += 1,
                MergeOutcome::Unchanged | MergeOutcome::DiscardedOlder => {}
            }
            if high_water.map_or(true, |w| row_updated > w) {
                high_water = Some(row_updated);
            }
        }

        if let Some(watermark) = high_water {
            if Some(watermark) != since {
                self.watermarks.set(E::ENTITY_TYPE, watermark).await?;
            }
        }

        Ok(changed)
    }

    /// Merge one remote record into the local store. Whole-record
    /// last-writer-wins on `sync_version`; conflicts are a normal, silent
    /// outcome, never an error.
    pub async fn merge_or_create(&self, remote_record: E) -> Result<MergeOutcome, AppError> {
        Self::merge_into(&self.local, remote_record).await
    }

    async fn merge_into(
        local: &Arc<dyn LocalRepository<E>>,
        remote_record: E,
    ) -> Result<MergeOutcome, AppError> {
        let existing = local.get(remote_record.id()).await?;

        let outcome = match existing {
            None => {
                let mut created = remote_record;
                created.set_sync_status(CloudSyncStatus::Synced);
                local.save(&created).await?;
                MergeOutcome::Created
            }
            Some(current) => {
                if remote_record.sync_version() > current.sync_version() {
                    let mut updated = remote_record;
                    updated.set_sync_status(CloudSyncStatus::Synced);
                    local.save(&updated).await?;
                    MergeOutcome::Updated
                } else if remote_record.sync_version() == current.sync_version() {
                    MergeOutcome::Unchanged
                } else {
                    tracing::debug!(
                        entity_type = %E::ENTITY_TYPE,
                        entity_id = %remote_record.id(),
                        remote_version = remote_record.sync_version(),
                        local_version = current.sync_version(),
                        "discarding older remote write"
                    );
                    MergeOutcome::DiscardedOlder
                }
            }
        };

        Ok(outcome)
    }

    /// Push many records in chunks. A connectivity failure queues the
    /// affected chunk; with `continue_on_error` the remaining chunks are
    /// still attempted, otherwise they are queued as well and the call
    /// returns (already-succeeded chunks stay synced).
    pub async fn batch_upload(
        &self,
        records: &[E],
        continue_on_error: bool,
    ) -> Result<BatchOutcome, AppError> {
        for record in records {
            self.guard_tenant(record)?;
        }

        let mut outcome = BatchOutcome::default();
        let chunk_size = self.config.batch_size.max(1) as usize;
        let chunks: Vec<&[E]> = records.chunks(chunk_size).collect();

        for (index, chunk) in chunks.iter().enumerate() {
            match self.upload_chunk_direct(chunk).await {
                Ok(()) => outcome.uploaded += chunk.len() as u64,
                Err(err) if err.is_retryable() => {
                    self.queue.set_online(false);
                    self.enqueue_chunk(chunk).await?;
                    outcome.queued += chunk.len() as u64;
                    if !continue_on_error {
                        for rest in &chunks[index + 1..] {
                            self.enqueue_chunk(rest).await?;
                            outcome.queued += rest.len() as u64;
                        }
                        return Ok(outcome);
                    }
                }
                Err(err) => {
                    outcome.failed += chunk.len() as u64;
                    for record in *chunk {
                        let mut failed = record.clone();
                        failed.set_sync_status(CloudSyncStatus::Failed);
                        self.local.save(&failed).await?;
                    }
                    if !continue_on_error {
                        for rest in &chunks[index + 1..] {
                            self.enqueue_chunk(rest).await?;
                            outcome.queued += rest.len() as u64;
                        }
                        return Err(err);
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// One chunk upsert that propagates errors. Marks the chunk Synced on
    /// success.
    pub async fn upload_chunk_direct(&self, chunk: &[E]) -> Result<(), AppError> {
        self.with_timeout(self.remote.upsert_batch(chunk)).await?;
        self.queue.set_online(true);

        let synced: Vec<E> = chunk
            .iter()
            .map(|record| {
                let mut updated = record.clone();
                updated.set_sync_status(CloudSyncStatus::Synced);
                updated
            })
            .collect();
        self.local.save_all(&synced).await?;
        Ok(())
    }

    async fn enqueue_chunk(&self, chunk: &[E]) -> Result<(), AppError> {
        for record in chunk {
            self.queue
                .enqueue(
                    OperationType::Upload,
                    E::ENTITY_TYPE,
                    record.id(),
                    record.shop_id(),
                )
                .await?;
        }
        Ok(())
    }

    /// Subscribe to the tenant-filtered change feed and merge events as they
    /// arrive. No-op when already subscribed.
    pub async fn start_realtime(&self) -> Result<(), AppError> {
        let mut guard = self.realtime.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let session = self
            .session
            .current_session()
            .ok_or_else(|| AppError::PermissionDenied("no active session".to_string()))?;

        let mut feed = self.remote.subscribe(&session.shop_id).await?;
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let local = self.local.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    maybe_change = feed.receiver.recv() => {
                        let Some(change) = maybe_change else { break };
                        if let Err(err) = Self::apply_change(&local, change).await {
                            tracing::warn!(
                                entity_type = %E::ENTITY_TYPE,
                                "failed to apply realtime change: {err}"
                            );
                        }
                    }
                }
            }
        });

        *guard = Some(RealtimeHandle { stop_tx, task });
        Ok(())
    }

    /// Stop the realtime subscription. Idempotent; the in-flight merge, if
    /// any, completes before the task exits.
    pub async fn stop_realtime(&self) {
        let handle = self.realtime.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.stop_tx.send(true);
            let _ = handle.task.await;
        }
    }

    async fn apply_change(
        local: &Arc<dyn LocalRepository<E>>,
        change: RemoteChange<E>,
    ) -> Result<(), AppError> {
        match change {
            RemoteChange::Upsert(record) => {
                Self::merge_into(local, record).await?;
            }
            RemoteChange::Delete { id, deleted_at } => {
                if let Some(mut record) = local.get(id).await? {
                    record.set_deleted_at(Some(deleted_at));
                    record.set_sync_status(CloudSyncStatus::Synced);
                    local.save(&record).await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<E: SyncRecord> OperationHandler for EntitySyncer<E> {
    async fn apply(&self, op: &SyncOperation) -> Result<(), AppError> {
        match op.op_type {
            OperationType::Upload => {
                let record = self.local.get(op.entity_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!(
                        "queued upload references missing record {}",
                        op.entity_id
                    ))
                })?;
                self.upload_direct(&record).await
            }
            OperationType::Delete => {
                self.with_timeout(self.remote.delete(&op.shop_id, op.entity_id))
                    .await?;
                if let Some(mut record) = self.local.get(op.entity_id).await? {
                    record.set_sync_status(CloudSyncStatus::Synced);
                    self.local.save(&record).await?;
                }
                Ok(())
            }
            OperationType::Download => self.download().await.map(|_| ()),
        }
    }

    async fn mark_record_failed(&self, entity_id: Uuid) -> Result<(), AppError> {
        if let Some(mut record) = self.local.get(entity_id).await? {
            record.set_sync_status(CloudSyncStatus::Failed);
            self.local.save(&record).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<E: SyncRecord> DependencyUploader for EntitySyncer<E> {
    async fn ensure_uploaded(&self, id: Uuid) -> Result<(), AppError> {
        match self.local.get(id).await? {
            Some(record) if record.sync_status() != CloudSyncStatus::Synced => {
                // Propagate connectivity failures instead of queueing here:
                // the child's own enqueue path then buffers the whole edit,
                // and replaying it re-attempts the parent first. Queueing the
                // parent and returning Ok would let the child upsert race
                // ahead of it.
                self.upload_direct(&record).await
            }
            Some(_) => Ok(()),
            None => {
                tracing::warn!(
                    entity_type = %E::ENTITY_TYPE,
                    entity_id = %id,
                    "dependency record missing locally, skipping"
                );
                Ok(())
            }
        }
    }
}
