use crate::application::ports::report_store::BackupStore;
use crate::application::ports::repositories::LocalRepository;
use crate::domain::entities::{
    Appointment, Customer, Employee, InventoryItem, Ticket, TimeClockEntry,
};
use crate::domain::value_objects::{CloudSyncStatus, ShopId};
use crate::infrastructure::database::mappers::{
    appointment_from_row, customer_from_row, employee_from_row, inventory_item_from_row,
    ticket_from_row, time_clock_entry_from_row,
};
use crate::infrastructure::database::rows::{
    AppointmentRow, CustomerRow, EmployeeRow, InventoryItemRow, TicketRow, TimeClockEntryRow,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn opt_millis(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|v| v.timestamp_millis())
}

/// sqlx-backed local store. One struct implements `LocalRepository` for every
/// entity type so the whole store shares a single pool and backup path.
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn count_rows(&self, sql: &str, shop_id: &ShopId) -> Result<u64, AppError> {
        let row = sqlx::query(sql)
            .bind(shop_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count").unwrap_or(0);
        Ok(count as u64)
    }

    async fn count_rows_with_status(
        &self,
        sql: &str,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        let row = sqlx::query(sql)
            .bind(shop_id.to_string())
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count").unwrap_or(0);
        Ok(count as u64)
    }

    async fn mark_pending(&self, sql: &str, shop_id: &ShopId) -> Result<u64, AppError> {
        let result = sqlx::query(sql)
            .bind(shop_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn upsert_customer<'e, E>(executor: E, record: &Customer) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO customers (
            id, shop_id, first_name, last_name, email, phone, notes,
            created_at, updated_at, sync_version, sync_status, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            shop_id = excluded.shop_id,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            phone = excluded.phone,
            notes = excluded.notes,
            updated_at = excluded.updated_at,
            sync_version = excluded.sync_version,
            sync_status = excluded.sync_status,
            deleted_at = excluded.deleted_at
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.shop_id.to_string())
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(&record.notes)
    .bind(millis(record.created_at))
    .bind(millis(record.updated_at))
    .bind(record.sync_version)
    .bind(record.sync_status.as_str())
    .bind(opt_millis(record.deleted_at))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl LocalRepository<Customer> for SqliteLocalStore {
    async fn get(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(customer_from_row).transpose()
    }

    async fn list(&self, shop_id: &ShopId) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT * FROM customers WHERE shop_id = ?1 AND deleted_at IS NULL ORDER BY updated_at DESC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(customer_from_row).collect()
    }

    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT * FROM customers WHERE shop_id = ?1 ORDER BY created_at ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(customer_from_row).collect()
    }

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT * FROM customers WHERE shop_id = ?1 AND sync_status = ?2 ORDER BY created_at ASC",
        )
        .bind(shop_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(customer_from_row).collect()
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.count_rows(
            "SELECT COUNT(*) as count FROM customers WHERE shop_id = ?1",
            shop_id,
        )
        .await
    }

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        self.count_rows_with_status(
            "SELECT COUNT(*) as count FROM customers WHERE shop_id = ?1 AND sync_status = ?2",
            shop_id,
            status,
        )
        .await
    }

    async fn save(&self, record: &Customer) -> Result<(), AppError> {
        upsert_customer(&self.pool, record).await
    }

    async fn save_all(&self, records: &[Customer]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_customer(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.mark_pending(
            "UPDATE customers SET sync_status = 'pending' WHERE shop_id = ?1 AND sync_status != 'pending'",
            shop_id,
        )
        .await
    }
}

async fn upsert_ticket<'e, E>(executor: E, record: &Ticket) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO tickets (
            id, shop_id, customer_id, ticket_number, device_type, device_model,
            issue_description, status, created_at, updated_at, sync_version,
            sync_status, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(id) DO UPDATE SET
            shop_id = excluded.shop_id,
            customer_id = excluded.customer_id,
            ticket_number = excluded.ticket_number,
            device_type = excluded.device_type,
            device_model = excluded.device_model,
            issue_description = excluded.issue_description,
            status = excluded.status,
            updated_at = excluded.updated_at,
            sync_version = excluded.sync_version,
            sync_status = excluded.sync_status,
            deleted_at = excluded.deleted_at
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.shop_id.to_string())
    .bind(record.customer_id.to_string())
    .bind(record.ticket_number)
    .bind(&record.device_type)
    .bind(&record.device_model)
    .bind(&record.issue_description)
    .bind(record.status.as_str())
    .bind(millis(record.created_at))
    .bind(millis(record.updated_at))
    .bind(record.sync_version)
    .bind(record.sync_status.as_str())
    .bind(opt_millis(record.deleted_at))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl LocalRepository<Ticket> for SqliteLocalStore {
    async fn get(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(ticket_from_row).transpose()
    }

    async fn list(&self, shop_id: &ShopId) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM tickets WHERE shop_id = ?1 AND deleted_at IS NULL ORDER BY ticket_number DESC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ticket_from_row).collect()
    }

    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM tickets WHERE shop_id = ?1 ORDER BY ticket_number ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ticket_from_row).collect()
    }

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM tickets WHERE shop_id = ?1 AND sync_status = ?2 ORDER BY ticket_number ASC",
        )
        .bind(shop_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ticket_from_row).collect()
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.count_rows(
            "SELECT COUNT(*) as count FROM tickets WHERE shop_id = ?1",
            shop_id,
        )
        .await
    }

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        self.count_rows_with_status(
            "SELECT COUNT(*) as count FROM tickets WHERE shop_id = ?1 AND sync_status = ?2",
            shop_id,
            status,
        )
        .await
    }

    async fn save(&self, record: &Ticket) -> Result<(), AppError> {
        upsert_ticket(&self.pool, record).await
    }

    async fn save_all(&self, records: &[Ticket]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_ticket(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.mark_pending(
            "UPDATE tickets SET sync_status = 'pending' WHERE shop_id = ?1 AND sync_status != 'pending'",
            shop_id,
        )
        .await
    }
}

async fn upsert_inventory_item<'e, E>(executor: E, record: &InventoryItem) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO inventory_items (
            id, shop_id, name, sku, quantity, price_cents, reorder_level,
            created_at, updated_at, sync_version, sync_status, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            shop_id = excluded.shop_id,
            name = excluded.name,
            sku = excluded.sku,
            quantity = excluded.quantity,
            price_cents = excluded.price_cents,
            reorder_level = excluded.reorder_level,
            updated_at = excluded.updated_at,
            sync_version = excluded.sync_version,
            sync_status = excluded.sync_status,
            deleted_at = excluded.deleted_at
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.shop_id.to_string())
    .bind(&record.name)
    .bind(&record.sku)
    .bind(record.quantity)
    .bind(record.price_cents)
    .bind(record.reorder_level)
    .bind(millis(record.created_at))
    .bind(millis(record.updated_at))
    .bind(record.sync_version)
    .bind(record.sync_status.as_str())
    .bind(opt_millis(record.deleted_at))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl LocalRepository<InventoryItem> for SqliteLocalStore {
    async fn get(&self, id: Uuid) -> Result<Option<InventoryItem>, AppError> {
        let row =
            sqlx::query_as::<_, InventoryItemRow>("SELECT * FROM inventory_items WHERE id = ?1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(inventory_item_from_row).transpose()
    }

    async fn list(&self, shop_id: &ShopId) -> Result<Vec<InventoryItem>, AppError> {
        let rows = sqlx::query_as::<_, InventoryItemRow>(
            "SELECT * FROM inventory_items WHERE shop_id = ?1 AND deleted_at IS NULL ORDER BY name ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(inventory_item_from_row).collect()
    }

    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<InventoryItem>, AppError> {
        let rows = sqlx::query_as::<_, InventoryItemRow>(
            "SELECT * FROM inventory_items WHERE shop_id = ?1 ORDER BY name ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(inventory_item_from_row).collect()
    }

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let rows = sqlx::query_as::<_, InventoryItemRow>(
            "SELECT * FROM inventory_items WHERE shop_id = ?1 AND sync_status = ?2 ORDER BY name ASC",
        )
        .bind(shop_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(inventory_item_from_row).collect()
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.count_rows(
            "SELECT COUNT(*) as count FROM inventory_items WHERE shop_id = ?1",
            shop_id,
        )
        .await
    }

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        self.count_rows_with_status(
            "SELECT COUNT(*) as count FROM inventory_items WHERE shop_id = ?1 AND sync_status = ?2",
            shop_id,
            status,
        )
        .await
    }

    async fn save(&self, record: &InventoryItem) -> Result<(), AppError> {
        upsert_inventory_item(&self.pool, record).await
    }

    async fn save_all(&self, records: &[InventoryItem]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_inventory_item(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.mark_pending(
            "UPDATE inventory_items SET sync_status = 'pending' WHERE shop_id = ?1 AND sync_status != 'pending'",
            shop_id,
        )
        .await
    }
}

async fn upsert_employee<'e, E>(executor: E, record: &Employee) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO employees (
            id, shop_id, first_name, last_name, email, role, hourly_rate_cents,
            created_at, updated_at, sync_version, sync_status, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            shop_id = excluded.shop_id,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            role = excluded.role,
            hourly_rate_cents = excluded.hourly_rate_cents,
            updated_at = excluded.updated_at,
            sync_version = excluded.sync_version,
            sync_status = excluded.sync_status,
            deleted_at = excluded.deleted_at
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.shop_id.to_string())
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.email)
    .bind(record.role.as_str())
    .bind(record.hourly_rate_cents)
    .bind(millis(record.created_at))
    .bind(millis(record.updated_at))
    .bind(record.sync_version)
    .bind(record.sync_status.as_str())
    .bind(opt_millis(record.deleted_at))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl LocalRepository<Employee> for SqliteLocalStore {
    async fn get(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(employee_from_row).transpose()
    }

    async fn list(&self, shop_id: &ShopId) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE shop_id = ?1 AND deleted_at IS NULL ORDER BY last_name ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(employee_from_row).collect()
    }

    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE shop_id = ?1 ORDER BY last_name ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(employee_from_row).collect()
    }

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE shop_id = ?1 AND sync_status = ?2 ORDER BY last_name ASC",
        )
        .bind(shop_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(employee_from_row).collect()
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.count_rows(
            "SELECT COUNT(*) as count FROM employees WHERE shop_id = ?1",
            shop_id,
        )
        .await
    }

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        self.count_rows_with_status(
            "SELECT COUNT(*) as count FROM employees WHERE shop_id = ?1 AND sync_status = ?2",
            shop_id,
            status,
        )
        .await
    }

    async fn save(&self, record: &Employee) -> Result<(), AppError> {
        upsert_employee(&self.pool, record).await
    }

    async fn save_all(&self, records: &[Employee]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_employee(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.mark_pending(
            "UPDATE employees SET sync_status = 'pending' WHERE shop_id = ?1 AND sync_status != 'pending'",
            shop_id,
        )
        .await
    }
}

async fn upsert_appointment<'e, E>(executor: E, record: &Appointment) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO appointments (
            id, shop_id, customer_id, scheduled_at, duration_minutes, kind, notes,
            created_at, updated_at, sync_version, sync_status, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            shop_id = excluded.shop_id,
            customer_id = excluded.customer_id,
            scheduled_at = excluded.scheduled_at,
            duration_minutes = excluded.duration_minutes,
            kind = excluded.kind,
            notes = excluded.notes,
            updated_at = excluded.updated_at,
            sync_version = excluded.sync_version,
            sync_status = excluded.sync_status,
            deleted_at = excluded.deleted_at
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.shop_id.to_string())
    .bind(record.customer_id.to_string())
    .bind(millis(record.scheduled_at))
    .bind(record.duration_minutes)
    .bind(&record.kind)
    .bind(&record.notes)
    .bind(millis(record.created_at))
    .bind(millis(record.updated_at))
    .bind(record.sync_version)
    .bind(record.sync_status.as_str())
    .bind(opt_millis(record.deleted_at))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl LocalRepository<Appointment> for SqliteLocalStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let row = sqlx::query_as::<_, AppointmentRow>("SELECT * FROM appointments WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(appointment_from_row).transpose()
    }

    async fn list(&self, shop_id: &ShopId) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            "SELECT * FROM appointments WHERE shop_id = ?1 AND deleted_at IS NULL ORDER BY scheduled_at ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(appointment_from_row).collect()
    }

    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            "SELECT * FROM appointments WHERE shop_id = ?1 ORDER BY scheduled_at ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(appointment_from_row).collect()
    }

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            "SELECT * FROM appointments WHERE shop_id = ?1 AND sync_status = ?2 ORDER BY scheduled_at ASC",
        )
        .bind(shop_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(appointment_from_row).collect()
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.count_rows(
            "SELECT COUNT(*) as count FROM appointments WHERE shop_id = ?1",
            shop_id,
        )
        .await
    }

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        self.count_rows_with_status(
            "SELECT COUNT(*) as count FROM appointments WHERE shop_id = ?1 AND sync_status = ?2",
            shop_id,
            status,
        )
        .await
    }

    async fn save(&self, record: &Appointment) -> Result<(), AppError> {
        upsert_appointment(&self.pool, record).await
    }

    async fn save_all(&self, records: &[Appointment]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_appointment(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.mark_pending(
            "UPDATE appointments SET sync_status = 'pending' WHERE shop_id = ?1 AND sync_status != 'pending'",
            shop_id,
        )
        .await
    }
}

async fn upsert_time_clock_entry<'e, E>(
    executor: E,
    record: &TimeClockEntry,
) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO time_clock_entries (
            id, shop_id, employee_id, clock_in, clock_out,
            created_at, updated_at, sync_version, sync_status, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            shop_id = excluded.shop_id,
            employee_id = excluded.employee_id,
            clock_in = excluded.clock_in,
            clock_out = excluded.clock_out,
            updated_at = excluded.updated_at,
            sync_version = excluded.sync_version,
            sync_status = excluded.sync_status,
            deleted_at = excluded.deleted_at
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.shop_id.to_string())
    .bind(record.employee_id.to_string())
    .bind(millis(record.clock_in))
    .bind(opt_millis(record.clock_out))
    .bind(millis(record.created_at))
    .bind(millis(record.updated_at))
    .bind(record.sync_version)
    .bind(record.sync_status.as_str())
    .bind(opt_millis(record.deleted_at))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl LocalRepository<TimeClockEntry> for SqliteLocalStore {
    async fn get(&self, id: Uuid) -> Result<Option<TimeClockEntry>, AppError> {
        let row =
            sqlx::query_as::<_, TimeClockEntryRow>("SELECT * FROM time_clock_entries WHERE id = ?1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(time_clock_entry_from_row).transpose()
    }

    async fn list(&self, shop_id: &ShopId) -> Result<Vec<TimeClockEntry>, AppError> {
        let rows = sqlx::query_as::<_, TimeClockEntryRow>(
            "SELECT * FROM time_clock_entries WHERE shop_id = ?1 AND deleted_at IS NULL ORDER BY clock_in DESC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(time_clock_entry_from_row).collect()
    }

    async fn list_all(&self, shop_id: &ShopId) -> Result<Vec<TimeClockEntry>, AppError> {
        let rows = sqlx::query_as::<_, TimeClockEntryRow>(
            "SELECT * FROM time_clock_entries WHERE shop_id = ?1 ORDER BY clock_in ASC",
        )
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(time_clock_entry_from_row).collect()
    }

    async fn list_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<Vec<TimeClockEntry>, AppError> {
        let rows = sqlx::query_as::<_, TimeClockEntryRow>(
            "SELECT * FROM time_clock_entries WHERE shop_id = ?1 AND sync_status = ?2 ORDER BY clock_in ASC",
        )
        .bind(shop_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(time_clock_entry_from_row).collect()
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.count_rows(
            "SELECT COUNT(*) as count FROM time_clock_entries WHERE shop_id = ?1",
            shop_id,
        )
        .await
    }

    async fn count_with_status(
        &self,
        shop_id: &ShopId,
        status: CloudSyncStatus,
    ) -> Result<u64, AppError> {
        self.count_rows_with_status(
            "SELECT COUNT(*) as count FROM time_clock_entries WHERE shop_id = ?1 AND sync_status = ?2",
            shop_id,
            status,
        )
        .await
    }

    async fn save(&self, record: &TimeClockEntry) -> Result<(), AppError> {
        upsert_time_clock_entry(&self.pool, record).await
    }

    async fn save_all(&self, records: &[TimeClockEntry]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_time_clock_entry(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_all_pending(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.mark_pending(
            "UPDATE time_clock_entries SET sync_status = 'pending' WHERE shop_id = ?1 AND sync_status != 'pending'",
            shop_id,
        )
        .await
    }
}

#[async_trait]
impl BackupStore for SqliteLocalStore {
    async fn create_backup(&self, backup_dir: &str) -> Result<String, AppError> {
        std::fs::create_dir_all(backup_dir)
            .map_err(|e| AppError::Internal(format!("failed to create backup dir: {e}")))?;

        let path = format!(
            "{}/protech-backup-{}.db",
            backup_dir.trim_end_matches('/'),
            Utc::now().format("%Y%m%d%H%M%S")
        );
        let sql = format!("VACUUM INTO '{}'", path.replace('\'', "''"));
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(path)
    }
}
