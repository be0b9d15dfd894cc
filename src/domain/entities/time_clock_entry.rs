use crate::domain::sync::{ParentRef, SyncRecord};
use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeClockEntry {
    pub id: Uuid,
    pub shop_id: ShopId,
    pub employee_id: Uuid,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
    pub sync_status: CloudSyncStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TimeClockEntry {
    pub fn new(shop_id: ShopId, employee_id: Uuid, clock_in: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_id,
            employee_id,
            clock_in,
            clock_out: None,
            created_at: now,
            updated_at: now,
            sync_version: 1,
            sync_status: CloudSyncStatus::Pending,
            deleted_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}

impl SyncRecord for TimeClockEntry {
    const ENTITY_TYPE: EntityType = EntityType::TimeClockEntry;

    fn id(&self) -> Uuid {
        self.id
    }

    fn shop_id(&self) -> ShopId {
        self.shop_id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn sync_version(&self) -> i64 {
        self.sync_version
    }

    fn set_sync_version(&mut self, version: i64) {
        self.sync_version = version;
    }

    fn sync_status(&self) -> CloudSyncStatus {
        self.sync_status
    }

    fn set_sync_status(&mut self, status: CloudSyncStatus) {
        self.sync_status = status;
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn parent_ref(&self) -> Option<ParentRef> {
        Some(ParentRef {
            entity_type: EntityType::Employee,
            id: self.employee_id,
        })
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(out) = self.clock_out {
            if out < self.clock_in {
                return Err("Clock out cannot precede clock in".to_string());
            }
        }
        Ok(())
    }
}
