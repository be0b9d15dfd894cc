use crate::domain::sync::{ParentRef, SyncRecord};
use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    CheckedIn,
    InProgress,
    WaitingForParts,
    Completed,
    PickedUp,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::CheckedIn => "checked_in",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::WaitingForParts => "waiting_for_parts",
            TicketStatus::Completed => "completed",
            TicketStatus::PickedUp => "picked_up",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "checked_in" => Ok(TicketStatus::CheckedIn),
            "in_progress" => Ok(TicketStatus::InProgress),
            "waiting_for_parts" => Ok(TicketStatus::WaitingForParts),
            "completed" => Ok(TicketStatus::Completed),
            "picked_up" => Ok(TicketStatus::PickedUp),
            other => Err(format!("Unknown ticket status: {other}")),
        }
    }
}

/// A repair ticket. References its customer by id, never by object graph;
/// the customer is the one parent that must be synced first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub shop_id: ShopId,
    pub customer_id: Uuid,
    pub ticket_number: i64,
    pub device_type: String,
    pub device_model: Option<String>,
    pub issue_description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_version: i64,
    pub sync_status: CloudSyncStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn new(
        shop_id: ShopId,
        customer_id: Uuid,
        ticket_number: i64,
        device_type: String,
        issue_description: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_id,
            customer_id,
            ticket_number,
            device_type,
            device_model: None,
            issue_description,
            status: TicketStatus::CheckedIn,
            created_at: now,
            updated_at: now,
            sync_version: 1,
            sync_status: CloudSyncStatus::Pending,
            deleted_at: None,
        }
    }
}

impl SyncRecord for Ticket {
    const ENTITY_TYPE: EntityType = EntityType::Ticket;

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
        if self.device_type.trim().is_empty() {
            return Err("Ticket must have a device type".to_string());
        }
        if self.ticket_number <= 0 {
            return Err("Ticket number must be positive".to_string());
        }
        Ok(())
    }
}
