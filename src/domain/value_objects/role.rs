use serde::{Deserialize, Serialize};

/// Employee / session role. Row-level security on the backend keys off the
/// pair (shop_id, role); the sync layer only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Technician,
    FrontDesk,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Technician => "technician",
            Role::FrontDesk => "front_desk",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "admin" => Ok(Role::Admin),
            "technician" => Ok(Role::Technician),
            "front_desk" => Ok(Role::FrontDesk),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}
