use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub shop_id: ShopId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
    pub sync_status: CloudSyncStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn new(shop_id: ShopId, first_name: String, last_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_id,
            first_name,
            last_name,
            email: None,
            phone: None,
            notes: None,
            created_at: now,
            updated_at: now,
            sync_version: 1,
            sync_status: CloudSyncStatus::Pending,
            deleted_at: None,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl SyncRecord for Customer {
    const ENTITY_TYPE: EntityType = EntityType::Customer;

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

    fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err("Customer must have a name".to_string());
        }
        Ok(())
    }
}
