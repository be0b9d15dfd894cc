use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Raw table shapes. Timestamps are epoch milliseconds; UUIDs and enums are
// stored as text and parsed in the mappers.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub shop_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_version: i64,
    pub sync_status: String,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketRow {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    pub ticket_number: i64,
    pub device_type: String,
    pub device_model: Option<String>,
    pub issue_description: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_version: i64,
    pub sync_status: String,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItemRow {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub price_cents: i64,
    pub reorder_level: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_version: i64,
    pub sync_status: String,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeRow {
    pub id: String,
    pub shop_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: String,
    pub hourly_rate_cents: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_version: i64,
    pub sync_status: String,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    pub scheduled_at: i64,
    pub duration_minutes: i64,
    pub kind: String,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_version: i64,
    pub sync_status: String,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeClockEntryRow {
    pub id: String,
    pub shop_id: String,
    pub employee_id: String,
    pub clock_in: i64,
    pub clock_out: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_version: i64,
    pub sync_status: String,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyncOperationRow {
    pub id: i64,
    pub op_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub shop_id: String,
    pub status: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub enqueued_at: i64,
    pub next_attempt_at: i64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatermarkRow {
    pub entity_type: String,
    pub last_synced_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MigrationReportRow {
    pub name: String,
    pub payload: String,
    pub saved_at: i64,
}
