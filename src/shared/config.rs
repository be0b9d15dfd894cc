use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub migration: MigrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub max_retry: u32,
    pub batch_size: u32,
    /// Backoff before a failed queue operation becomes eligible again:
    /// backoff_base_secs * 2^retry_count.
    pub backoff_base_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub backup_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/protech.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig::default(),
            migration: MigrationConfig {
                backup_dir: "./backups".to_string(),
            },
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retry: 3,
            batch_size: 50,
            backoff_base_secs: 2,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PROTECH_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("PROTECH_DB_MAX_CONNECTIONS") {
            if let Some(value) = parse_u32(&v) {
                cfg.database.max_connections = value;
            }
        }
        if let Ok(v) = std::env::var("PROTECH_SYNC_MAX_RETRY") {
            if let Some(value) = parse_u32(&v) {
                cfg.sync.max_retry = value;
            }
        }
        if let Ok(v) = std::env::var("PROTECH_SYNC_BATCH_SIZE") {
            if let Some(value) = parse_u32(&v) {
                cfg.sync.batch_size = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("PROTECH_SYNC_BACKOFF_BASE_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.backoff_base_secs = value;
            }
        }
        if let Ok(v) = std::env::var("PROTECH_SYNC_REQUEST_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.request_timeout_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("PROTECH_MIGRATION_BACKUP_DIR") {
            if !v.trim().is_empty() {
                cfg.migration.backup_dir = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.batch_size == 0 {
            return Err("Sync batch_size must be greater than 0".to_string());
        }
        if self.sync.request_timeout_secs == 0 {
            return Err("Sync request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.sync.batch_size = 0;
        assert!(cfg.validate().is_err());
    }
}
