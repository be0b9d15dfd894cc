use crate::domain::value_objects::{EntityType, OperationStatus, OperationType, ShopId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durable queued mutation. Created when a remote call cannot be made
/// (offline or transient failure); removed on success; parked as Failed once
/// retries are exhausted so the operator can still see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    pub id: i64,
    pub op_type: OperationType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub shop_id: ShopId,
    pub status: OperationStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Earliest time this operation is eligible for another attempt.
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl SyncOperation {
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

/// The fields the queue service controls when inserting or replacing an
/// operation. Row id, status and retry bookkeeping belong to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSyncOperation {
    pub op_type: OperationType,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub shop_id: ShopId,
    pub max_retries: u32,
}
