use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A parent record that must reach the remote before its child does.
/// Dependencies in this domain are at most one hop deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef {
    pub entity_type: EntityType,
    pub id: Uuid,
}

/// The sync envelope every syncable entity carries. The generic syncer,
/// offline queue and migration orchestrator only see records through this
/// trait.
pub trait SyncRecord: Clone + Send + Sync + 'static {
    const ENTITY_TYPE: EntityType;

    fn id(&self) -> Uuid;
    fn shop_id(&self) -> ShopId;
    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);
    fn sync_version(&self) -> i64;
    fn set_sync_version(&mut self, version: i64);
    fn sync_status(&self) -> CloudSyncStatus;
    fn set_sync_status(&mut self, status: CloudSyncStatus);
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    fn parent_ref(&self) -> Option<ParentRef> {
        None
    }

    /// Shape check run before a record is uploaded during migration.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Bookkeeping for a local edit: the record becomes newer than its remote
    /// counterpart and needs another push.
    fn mark_locally_edited(&mut self) {
        self.set_sync_version(self.sync_version() + 1);
        self.set_updated_at(Utc::now());
        self.set_sync_status(CloudSyncStatus::Pending);
    }

    /// Soft delete. The tombstone still participates in sync so the remote
    /// and other devices learn about the removal.
    fn mark_deleted(&mut self) {
        self.set_deleted_at(Some(Utc::now()));
        self.mark_locally_edited();
    }
}
