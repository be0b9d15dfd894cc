use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tenant partition key. Every syncable record and every session carries one;
/// cross-tenant writes are rejected before they reach the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopId(Uuid);

impl ShopId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| format!("Invalid shop id: {value}"))
    }
}

impl fmt::Display for ShopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
