use serde::{Deserialize, Serialize};

/// Per-record sync state as seen by the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudSyncStatus {
    Pending,
    Synced,
    Failed,
}

impl CloudSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudSyncStatus::Pending => "pending",
            CloudSyncStatus::Synced => "synced",
            CloudSyncStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(CloudSyncStatus::Pending),
            "synced" => Ok(CloudSyncStatus::Synced),
            "failed" => Ok(CloudSyncStatus::Failed),
            other => Err(format!("Unknown sync status: {other}")),
        }
    }
}
