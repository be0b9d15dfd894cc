use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub shop_id: ShopId,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub price_cents: i64,
    pub reorder_level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
    pub sync_status: CloudSyncStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    pub fn new(shop_id: ShopId, name: String, quantity: i64, price_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_id,
            name,
            sku: None,
            quantity,
            price_cents,
            reorder_level: 0,
            created_at: now,
            updated_at: now,
            sync_version: 1,
            sync_status: CloudSyncStatus::Pending,
            deleted_at: None,
        }
    }

    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

impl SyncRecord for InventoryItem {
    const ENTITY_TYPE: EntityType = EntityType::InventoryItem;

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
        if self.name.trim().is_empty() {
            return Err("Inventory item must have a name".to_string());
        }
        if self.quantity < 0 {
            return Err("Inventory quantity cannot be negative".to_string());
        }
        Ok(())
    }
}
