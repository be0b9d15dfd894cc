use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::{CloudSyncStatus, ShopId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Sole mutation path into the local store for one entity type. Sync
/// bookkeeping (`sync_status`, `sync_version`) stays consistent because
/// nothing writes around `save`.
#[async_trait]
pub trait LocalRepository<E: SyncRecord>: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<E>, AppError>;

    /// Records visible to the UI: tombstones excluded.
    async fn list(&self, shop_id: &ShopId) -> Result<Vec<E>, AppError>;

    /// Everything including tombstones, for sync and migration passes.
    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<E>, AppError>;

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<E>, AppError>;

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError>;

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError>;

    async fn save(&self, record: &E) -> Result<(), AppError>;

    /// Transactional multi-record save.
    async fn save_all(&self, records: &[E]) -> Result<(), AppError>;

    /// Rollback support: reset every record's sync status to Pending so the
    /// next run re-attempts. Returns the number of records touched.
    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError>;
}
