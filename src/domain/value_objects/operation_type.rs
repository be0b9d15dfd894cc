use serde::{Deserialize, Serialize};

/// Intent of a queued sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Upload,
    Download,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Upload => "upload",
            OperationType::Download => "download",
            OperationType::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "upload" => Ok(OperationType::Upload),
            "download" => Ok(OperationType::Download),
            "delete" => Ok(OperationType::Delete),
            other => Err(format!("Unknown operation type: {other}")),
        }
    }
}

/// Lifecycle of a queued operation. A successful operation is removed from
/// the queue entirely, so there is no terminal success state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(OperationStatus::Pending),
            "failed" => Ok(OperationStatus::Failed),
            other => Err(format!("Unknown operation status: {other}")),
        }
    }
}
