use crate::application::ports::offline_store::QueueStore;
use crate::domain::entities::{NewSyncOperation, SyncOperation};
use crate::domain::value_objects::EntityType;
use crate::infrastructure::database::mappers::sync_operation_from_row;
use crate::infrastructure::database::rows::SyncOperationRow;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Durable FIFO queue backed by the `sync_queue` table. Enqueue order is the
/// AUTOINCREMENT id, so `replace` keeps an operation's position by reusing
/// its row.
pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> Result<SyncOperation, AppError> {
        let row = sqlx::query_as::<_, SyncOperationRow>("SELECT * FROM sync_queue WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("queued operation {id} not found")))?;
        sync_operation_from_row(row)
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn insert(&self, op: &NewSyncOperation) -> Result<i64, AppError> {
        let now = Utc::now().timestamp_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO sync_queue (
                op_type, entity_type, entity_id, shop_id, status,
                retry_count, max_retries, enqueued_at, next_attempt_at, last_error
            ) VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5, ?6, ?6, NULL)
            "#,
        )
        .bind(op.op_type.as_str())
        .bind(op.entity_type.as_str())
        .bind(op.entity_id.to_string())
        .bind(op.shop_id.to_string())
        .bind(op.max_retries as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn find_pending_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Option<SyncOperation>, AppError> {
        let row = sqlx::query_as::<_, SyncOperationRow>(
            r#"
            SELECT * FROM sync_queue
            WHERE entity_type = ?1 AND entity_id = ?2 AND status = 'pending'
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(sync_operation_from_row).transpose()
    }

    async fn replace(&self, id: i64, op: &NewSyncOperation) -> Result<(), AppError> {
        // Keeps the row (and therefore the queue position), resets retry
        // bookkeeping for the new intent.
        let now = Utc::now().timestamp_millis();
        let result = sqlx::query(
            r#"
            UPDATE sync_queue SET
                op_type = ?2,
                entity_type = ?3,
                entity_id = ?4,
                shop_id = ?5,
                status = 'pending',
                retry_count = 0,
                max_retries = ?6,
                next_attempt_at = ?7,
                last_error = NULL
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(op.op_type.as_str())
        .bind(op.entity_type.as_str())
        .bind(op.entity_id.to_string())
        .bind(op.shop_id.to_string())
        .bind(op.max_retries as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "queued operation {id} not found"
            )));
        }
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<SyncOperation>, AppError> {
        let rows = sqlx::query_as::<_, SyncOperationRow>(
            "SELECT * FROM sync_queue WHERE status = 'pending' ORDER BY enqueued_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(sync_operation_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<SyncOperation>, AppError> {
        let rows = sqlx::query_as::<_, SyncOperationRow>(
            "SELECT * FROM sync_queue ORDER BY enqueued_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(sync_operation_from_row).collect()
    }

    async fn remove(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<SyncOperation, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sync_queue SET
                retry_count = retry_count + 1,
                next_attempt_at = ?2,
                last_error = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(next_attempt_at.timestamp_millis())
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "queued operation {id} not found"
            )));
        }
        self.fetch(id).await
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sync_queue SET status = 'failed', last_error = ?2 WHERE id = ?1")
            .bind(id)
            .bind(error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sync_queue WHERE status = 'pending'")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{OperationStatus, OperationType, ShopId};
    use crate::infrastructure::database::connection_pool::ConnectionPool;

    async fn store() -> SqliteQueueStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        SqliteQueueStore::new(pool.get_pool().clone())
    }

    fn new_op(op_type: OperationType, entity_id: Uuid, shop_id: &ShopId) -> NewSyncOperation {
        NewSyncOperation {
            op_type,
            entity_type: EntityType::Customer,
            entity_id,
            shop_id: shop_id.clone(),
            max_retries: 3,
        }
    }

    #[tokio::test]
    async fn insert_preserves_fifo_order() {
        let store = store().await;
        let shop_id = ShopId::generate();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store
            .insert(&new_op(OperationType::Upload, first, &shop_id))
            .await
            .unwrap();
        store
            .insert(&new_op(OperationType::Upload, second, &shop_id))
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].entity_id, first);
        assert_eq!(pending[1].entity_id, second);
    }

    #[tokio::test]
    async fn replace_keeps_queue_position() {
        let store = store().await;
        let shop_id = ShopId::generate();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let id = store
            .insert(&new_op(OperationType::Upload, first, &shop_id))
            .await
            .unwrap();
        store
            .insert(&new_op(OperationType::Upload, second, &shop_id))
            .await
            .unwrap();

        store
            .replace(id, &new_op(OperationType::Delete, first, &shop_id))
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending[0].entity_id, first);
        assert_eq!(pending[0].op_type, OperationType::Delete);
        assert_eq!(pending[0].retry_count, 0);
    }

    #[tokio::test]
    async fn record_failure_bumps_retry_count() {
        let store = store().await;
        let shop_id = ShopId::generate();
        let id = store
            .insert(&new_op(OperationType::Upload, Uuid::new_v4(), &shop_id))
            .await
            .unwrap();

        let later = Utc::now() + chrono::Duration::seconds(30);
        let op = store.record_failure(id, "connection refused", later).await.unwrap();

        assert_eq!(op.retry_count, 1);
        assert_eq!(op.last_error.as_deref(), Some("connection refused"));
        assert_eq!(op.next_attempt_at.timestamp_millis(), later.timestamp_millis());
    }

    #[tokio::test]
    async fn failed_operations_survive_clear() {
        let store = store().await;
        let shop_id = ShopId::generate();
        let parked = store
            .insert(&new_op(OperationType::Upload, Uuid::new_v4(), &shop_id))
            .await
            .unwrap();
        store
            .insert(&new_op(OperationType::Upload, Uuid::new_v4(), &shop_id))
            .await
            .unwrap();

        store.mark_failed(parked, "boom").await.unwrap();
        let removed = store.clear().await.unwrap();

        assert_eq!(removed, 1);
        assert!(store.list_pending().await.unwrap().is_empty());
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, OperationStatus::Failed);
    }
}
