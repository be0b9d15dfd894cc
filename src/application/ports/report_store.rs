use crate::shared::error::AppError;
use async_trait::async_trait;

/// Opaque persisted reports keyed by a well-known name ("view last migration
/// report" reads these back).
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save_report(&self, name: &str, payload: &serde_json::Value) -> Result<(), AppError>;
    async fn load_report(&self, name: &str) -> Result<Option<serde_json::Value>, AppError>;
}

/// Snapshot of the local store, taken before a migration mutates anything.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Returns the path of the snapshot written.
    async fn create_backup(&self, backup_dir: &str) -> Result<String, AppError>;
}
