use crate::domain::sync::{ParentRef, SyncRecord};
use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub shop_id: ShopId,
    pub customer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub kind: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
    pub sync_status: CloudSyncStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn new(
        shop_id: ShopId,
        customer_id: Uuid,
        scheduled_at: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_id,
            customer_id,
            scheduled_at,
            duration_minutes,
            kind: "repair".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
            sync_version: 1,
            sync_status: CloudSyncStatus::Pending,
            deleted_at: None,
        }
    }
}

impl SyncRecord for Appointment {
    const ENTITY_TYPE: EntityType = EntityType::Appointment;

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
            entity_type: EntityType::Customer,
            id: self.customer_id,
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.duration_minutes <= 0 {
            return Err("Appointment duration must be positive".to_string());
        }
        Ok(())
    }
}
