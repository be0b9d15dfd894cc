use crate::application::ports::offline_store::QueueStore;
use crate::domain::entities::{NewSyncOperation, SyncOperation};
use crate::domain::value_objects::{EntityType, OperationType, ShopId};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// Applies one queued operation against the remote. Implemented by each
/// entity syncer; registered per entity type.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn apply(&self, op: &SyncOperation) -> Result<(), AppError>;

    /// Called when an operation is parked as Failed so the underlying local
    /// record reflects the dead-letter state.
    async fn mark_record_failed(&self, entity_id: Uuid) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub succeeded: usize,
    pub retried: usize,
    pub failed: usize,
    /// Operations whose backoff window had not elapsed yet.
    pub skipped: usize,
}

/// Durable buffer for mutations that could not reach the remote. Replays in
/// enqueue order with bounded retries; exhausted operations are parked as
/// Failed and stay visible, never silently dropped.
pub struct OfflineQueue {
    store: Arc<dyn QueueStore>,
    config: SyncConfig,
    online: AtomicBool,
    handlers: RwLock<HashMap<EntityType, Arc<dyn OperationHandler>>>,
    // Serializes drains. Enqueue never takes this lock, so appends during a
    // drain are safe.
    drain_lock: Mutex<()>,
}

impl OfflineQueue {
    pub fn new(store: Arc<dyn QueueStore>, config: SyncConfig) -> Self {
        Self {
            store,
            config,
            online: AtomicBool::new(true),
            handlers: RwLock::new(HashMap::new()),
            drain_lock: Mutex::new(()),
        }
    }

    pub async fn register_handler(
        &self,
        entity_type: EntityType,
        handler: Arc<dyn OperationHandler>,
    ) {
        self.handlers.write().await.insert(entity_type, handler);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Buffer an operation. At most one pending operation exists per entity
    /// id: a newer upload replaces an older pending upload in place (keeping
    /// its queue position, so FIFO order reflects the first intent), and a
    /// delete supersedes any pending upload. A pending delete is never
    /// downgraded by a later upload.
    pub async fn enqueue(
        &self,
        op_type: OperationType,
        entity_type: EntityType,
        entity_id: Uuid,
        shop_id: ShopId,
    ) -> Result<i64, AppError> {
        let op = NewSyncOperation {
            op_type,
            entity_type,
            entity_id,
            shop_id,
            max_retries: self.config.max_retry,
        };

        match self
            .store
            .find_pending_for_entity(entity_type, entity_id)
            .await?
        {
            None => self.store.insert(&op).await,
            Some(existing) if existing.op_type == OperationType::Delete => {
                tracing::debug!(
                    entity_type = %entity_type,
                    entity_id = %entity_id,
                    "pending delete supersedes new {} operation",
                    op_type.as_str()
                );
                Ok(existing.id)
            }
            Some(existing) => {
                self.store.replace(existing.id, &op).await?;
                Ok(existing.id)
            }
        }
    }

    /// Drain pending operations in enqueue order. Operations still inside
    /// their backoff window are skipped and picked up on a later drain.
    pub async fn process_pending_queue(&self) -> Result<DrainOutcome, AppError> {
        let _guard = self.drain_lock.lock().await;

        let mut outcome = DrainOutcome::default();
        let ops = self.store.list_pending().await?;
        let now = Utc::now();

        for op in ops {
            if op.next_attempt_at > now {
                outcome.skipped += 1;
                continue;
            }

            let handler = self.handlers.read().await.get(&op.entity_type).cloned();
            let Some(handler) = handler else {
                self.store
                    .mark_failed(op.id, "no handler registered for entity type")
                    .await?;
                outcome.failed += 1;
                continue;
            };

            match handler.apply(&op).await {
                Ok(()) => {
                    self.store.remove(op.id).await?;
                    self.set_online(true);
                    outcome.succeeded += 1;
                }
                Err(err) if err.is_retryable() => {
                    self.set_online(false);
                    if op.retries_exhausted() {
                        tracing::warn!(
                            op_id = op.id,
                            entity_id = %op.entity_id,
                            "retries exhausted, parking operation as failed: {err}"
                        );
                        self.store.mark_failed(op.id, &err.to_string()).await?;
                        handler.mark_record_failed(op.entity_id).await?;
                        outcome.failed += 1;
                    } else {
                        let next = now + self.backoff_delay(op.retry_count);
                        self.store
                            .record_failure(op.id, &err.to_string(), next)
                            .await?;
                        outcome.retried += 1;
                    }
                }
                Err(err) => {
                    // Authorization and validation failures cannot succeed on
                    // retry; park immediately without consuming attempts.
                    tracing::warn!(
                        op_id = op.id,
                        entity_id = %op.entity_id,
                        "terminal failure, parking operation: {err}"
                    );
                    self.store.mark_failed(op.id, &err.to_string()).await?;
                    handler.mark_record_failed(op.entity_id).await?;
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Discard all pending operations without applying them. Test and reset
    /// scenarios only.
    pub async fn clear_queue(&self) -> Result<u64, AppError> {
        self.store.clear().await
    }

    pub async fn pending_operations(&self) -> Result<Vec<SyncOperation>, AppError> {
        self.store.list_pending().await
    }

    /// Every operation including parked failures, for operator inspection.
    pub async fn all_operations(&self) -> Result<Vec<SyncOperation>, AppError> {
        self.store.list_all().await
    }

    /// "N pending, M failed" for UI badges.
    pub async fn counts(&self) -> Result<QueueCounts, AppError> {
        let ops = self.store.list_all().await?;
        let pending = ops
            .iter()
            .filter(|op| op.status == crate::domain::value_objects::OperationStatus::Pending)
            .count();
        Ok(QueueCounts {
            pending,
            failed: ops.len() - pending,
        })
    }

    fn backoff_delay(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.min(16);
        let secs = self.config.backoff_base_secs.saturating_mul(1 << exponent);
        Duration::seconds(secs as i64)
    }
}
