use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::ShopId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// A change pushed over the remote's realtime feed, already filtered to the
/// subscribed tenant.
#[derive(Debug, Clone)]
pub enum RemoteChange<E> {
    Upsert(E),
    Delete {
        id: Uuid,
        deleted_at: DateTime<Utc>,
    },
}

/// An open realtime subscription. Dropping the receiver ends delivery; the
/// consumer owns its own stop signalling.
pub struct RemoteFeed<E> {
    pub receiver: mpsc::UnboundedReceiver<RemoteChange<E>>,
}

/// Tenant-scoped access to one remote table. Implementations must surface
/// authorization failures as `AppError::PermissionDenied` and connectivity
/// failures (offline, timeout) as `AppError::Connectivity` — the queue's
/// retry policy depends on the distinction.
#[async_trait]
pub trait RemoteTable<E: SyncRecord>: Send + Sync {
    /// Upsert keyed by record id. Atomic per record.
    async fn upsert(&self, record: &E) -> Result<(), AppError>;

    async fn upsert_batch(&self, records: &[E]) -> Result<(), AppError>;

    /// Rows for the tenant with `updated_at` strictly greater than `since`
    /// (everything when `since` is None). Tombstoned rows are included.
    async fn select_updated_since(
        &self,
        shop_id: &ShopId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<E>, AppError>;

    async fn delete(&self, shop_id: &ShopId, id: Uuid) -> Result<(), AppError>;

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError>;

    /// Subscribe to the tenant-filtered change feed.
    async fn subscribe(&self, shop_id: &ShopId) -> Result<RemoteFeed<E>, AppError>;
}
