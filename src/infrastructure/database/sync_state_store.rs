use crate::application::ports::offline_store::WatermarkStore;
use crate::application::ports::report_store::ReportStore;
use crate::domain::value_objects::EntityType;
use crate::infrastructure::database::mappers::timestamp;
use crate::infrastructure::database::rows::{MigrationReportRow, WatermarkRow};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Download watermarks and persisted reports, both small key-value tables.
pub struct SqliteSyncStateStore {
    pool: SqlitePool,
}

impl SqliteSyncStateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatermarkStore for SqliteSyncStateStore {
    async fn get(&self, entity_type: EntityType) -> Result<Option<DateTime<Utc>>, AppError> {
        let row = sqlx::query_as::<_, WatermarkRow>(
            "SELECT * FROM sync_watermarks WHERE entity_type = ?1",
        )
        .bind(entity_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| timestamp(r.last_synced_at)).transpose()
    }

    async fn set(&self, entity_type: EntityType, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sync_watermarks (entity_type, last_synced_at)
            VALUES (?1, ?2)
            ON CONFLICT(entity_type) DO UPDATE SET last_synced_at = excluded.last_synced_at
            "#,
        )
        .bind(entity_type.as_str())
        .bind(at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for SqliteSyncStateStore {
    async fn save_report(&self, name: &str, payload: &serde_json::Value) -> Result<(), AppError> {
        let serialized = serde_json::to_string(payload)?;
        sqlx::query(
            r#"
            INSERT INTO migration_reports (name, payload, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(name)
        .bind(serialized)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_report(&self, name: &str) -> Result<Option<serde_json::Value>, AppError> {
        let row = sqlx::query_as::<_, MigrationReportRow>(
            "SELECT * FROM migration_reports WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| serde_json::from_str(&r.payload).map_err(AppError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connection_pool::ConnectionPool;
    use serde_json::json;

    async fn store() -> SqliteSyncStateStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        SqliteSyncStateStore::new(pool.get_pool().clone())
    }

    #[tokio::test]
    async fn watermark_defaults_to_none_and_upserts() {
        let store = store().await;
        assert!(store.get(EntityType::Ticket).await.unwrap().is_none());

        let first = Utc::now();
        store.set(EntityType::Ticket, first).await.unwrap();
        let later = first + chrono::Duration::minutes(5);
        store.set(EntityType::Ticket, later).await.unwrap();

        let stored = store.get(EntityType::Ticket).await.unwrap().unwrap();
        assert_eq!(stored.timestamp_millis(), later.timestamp_millis());
        // Other entity types are unaffected.
        assert!(store.get(EntityType::Customer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn report_round_trips_and_overwrites() {
        let store = store().await;
        assert!(store.load_report("last").await.unwrap().is_none());

        store
            .save_report("last", &json!({"phase": "completed", "migrated": 10}))
            .await
            .unwrap();
        store
            .save_report("last", &json!({"phase": "failed", "migrated": 4}))
            .await
            .unwrap();

        let loaded = store.load_report("last").await.unwrap().unwrap();
        assert_eq!(loaded["phase"], "failed");
        assert_eq!(loaded["migrated"], 4);
    }
}
