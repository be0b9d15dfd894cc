use crate::domain::entities::{NewSyncOperation, SyncOperation};
use crate::domain::value_objects::EntityType;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Durable storage primitives for the offline queue. Supersede and retry
/// policy live in the queue service; this trait only persists.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn insert(&self, op: &NewSyncOperation) -> Result<i64, AppError>;

    /// The single pending operation for an entity, if any. Enqueue keeps at
    /// most one pending operation per entity id.
    async fn find_pending_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Option<SyncOperation>, AppError>;

    /// Overwrite an operation's intent in place, keeping its queue position.
    async fn replace(&self, id: i64, op: &NewSyncOperation) -> Result<(), AppError>;

    /// Pending operations in enqueue order.
    async fn list_pending(&self) -> Result<Vec<SyncOperation>, AppError>;

    /// Every operation, failed ones included, for operator inspection.
    async fn list_all(&self) -> Result<Vec<SyncOperation>, AppError>;

    async fn remove(&self, id: i64) -> Result<(), AppError>;

    /// Bump retry_count and set the next eligibility time after a retryable
    /// failure. Returns the updated operation.
    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<SyncOperation, AppError>;

    /// Park the operation as Failed. It stays enumerable but is excluded
    /// from automatic drains.
    async fn mark_failed(&self, id: i64, error: &str) -> Result<(), AppError>;

    /// Discard all pending operations. Returns the number removed.
    async fn clear(&self) -> Result<u64, AppError>;
}

/// Per-entity-type download cursor: the highest remote `updated_at` already
/// merged, bounding the next incremental pull.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    async fn get(&self, entity_type: EntityType) -> Result<Option<DateTime<Utc>>, AppError>;
    async fn set(&self, entity_type: EntityType, at: DateTime<Utc>) -> Result<(), AppError>;
}
