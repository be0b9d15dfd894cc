use crate::domain::entities::{
    Appointment, Customer, Employee, InventoryItem, SyncOperation, Ticket, TicketStatus,
    TimeClockEntry,
};
use crate::domain::value_objects::{
    CloudSyncStatus, EntityType, OperationStatus, OperationType, Role, ShopId,
};
use crate::infrastructure::database::rows::{
    AppointmentRow, CustomerRow, EmployeeRow, InventoryItemRow, SyncOperationRow, TicketRow,
    TimeClockEntryRow,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn parse_uuid(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::Database(format!("corrupt uuid column: {value}")))
}

pub fn parse_shop_id(value: &str) -> Result<ShopId, AppError> {
    ShopId::parse(value).map_err(AppError::Database)
}

pub fn timestamp(millis: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Database(format!("corrupt timestamp column: {millis}")))
}

pub fn opt_timestamp(millis: Option<i64>) -> Result<Option<DateTime<Utc>>, AppError> {
    millis.map(timestamp).transpose()
}

pub fn sync_status(value: &str) -> Result<CloudSyncStatus, AppError> {
    CloudSyncStatus::parse(value).map_err(AppError::Database)
}

pub fn customer_from_row(row: CustomerRow) -> Result<Customer, AppError> {
    Ok(Customer {
        id: parse_uuid(&row.id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        notes: row.notes,
        created_at: timestamp(row.created_at)?,
        updated_at: timestamp(row.updated_at)?,
        sync_version: row.sync_version,
        sync_status: sync_status(&row.sync_status)?,
        deleted_at: opt_timestamp(row.deleted_at)?,
    })
}

pub fn ticket_from_row(row: TicketRow) -> Result<Ticket, AppError> {
    Ok(Ticket {
        id: parse_uuid(&row.id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        customer_id: parse_uuid(&row.customer_id)?,
        ticket_number: row.ticket_number,
        device_type: row.device_type,
        device_model: row.device_model,
        issue_description: row.issue_description,
        status: TicketStatus::parse(&row.status).map_err(AppError::Database)?,
        created_at: timestamp(row.created_at)?,
        updated_at: timestamp(row.updated_at)?,
        sync_version: row.sync_version,
        sync_status: sync_status(&row.sync_status)?,
        deleted_at: opt_timestamp(row.deleted_at)?,
    })
}

pub fn inventory_item_from_row(row: InventoryItemRow) -> Result<InventoryItem, AppError> {
    Ok(InventoryItem {
        id: parse_uuid(&row.id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        name: row.name,
        sku: row.sku,
        quantity: row.quantity,
        price_cents: row.price_cents,
        reorder_level: row.reorder_level,
        created_at: timestamp(row.created_at)?,
        updated_at: timestamp(row.updated_at)?,
        sync_version: row.sync_version,
        sync_status: sync_status(&row.sync_status)?,
        deleted_at: opt_timestamp(row.deleted_at)?,
    })
}

pub fn employee_from_row(row: EmployeeRow) -> Result<Employee, AppError> {
    Ok(Employee {
        id: parse_uuid(&row.id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        role: Role::parse(&row.role).map_err(AppError::Database)?,
        hourly_rate_cents: row.hourly_rate_cents,
        created_at: timestamp(row.created_at)?,
        updated_at: timestamp(row.updated_at)?,
        sync_version: row.sync_version,
        sync_status: sync_status(&row.sync_status)?,
        deleted_at: opt_timestamp(row.deleted_at)?,
    })
}

pub fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, AppError> {
    Ok(Appointment {
        id: parse_uuid(&row.id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        customer_id: parse_uuid(&row.customer_id)?,
        scheduled_at: timestamp(row.scheduled_at)?,
        duration_minutes: row.duration_minutes,
        kind: row.kind,
        notes: row.notes,
        created_at: timestamp(row.created_at)?,
        updated_at: timestamp(row.updated_at)?,
        sync_version: row.sync_version,
        sync_status: sync_status(&row.sync_status)?,
        deleted_at: opt_timestamp(row.deleted_at)?,
    })
}

pub fn time_clock_entry_from_row(row: TimeClockEntryRow) -> Result<TimeClockEntry, AppError> {
    Ok(TimeClockEntry {
        id: parse_uuid(&row.id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        employee_id: parse_uuid(&row.employee_id)?,
        clock_in: timestamp(row.clock_in)?,
        clock_out: opt_timestamp(row.clock_out)?,
        created_at: timestamp(row.created_at)?,
        updated_at: timestamp(row.updated_at)?,
        sync_version: row.sync_version,
        sync_status: sync_status(&row.sync_status)?,
        deleted_at: opt_timestamp(row.deleted_at)?,
    })
}

pub fn sync_operation_from_row(row: SyncOperationRow) -> Result<SyncOperation, AppError> {
    Ok(SyncOperation {
        id: row.id,
        op_type: OperationType::parse(&row.op_type).map_err(AppError::Database)?,
        entity_type: EntityType::parse(&row.entity_type).map_err(AppError::Database)?,
        entity_id: parse_uuid(&row.entity_id)?,
        shop_id: parse_shop_id(&row.shop_id)?,
        status: OperationStatus::parse(&row.status).map_err(AppError::Database)?,
        retry_count: row.retry_count as u32,
        max_retries: row.max_retries as u32,
        enqueued_at: timestamp(row.enqueued_at)?,
        next_attempt_at: timestamp(row.next_attempt_at)?,
        last_error: row.last_error,
    })
}
