use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of syncable entity kinds. Doubles as the remote table tag
/// and the key for download watermarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Customer,
    Ticket,
    InventoryItem,
    Employee,
    Appointment,
    TimeClockEntry,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Customer => "customer",
            EntityType::Ticket => "ticket",
            EntityType::InventoryItem => "inventory_item",
            EntityType::Employee => "employee",
            EntityType::Appointment => "appointment",
            EntityType::TimeClockEntry => "time_clock_entry",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "customer" => Ok(EntityType::Customer),
            "ticket" => Ok(EntityType::Ticket),
            "inventory_item" => Ok(EntityType::InventoryItem),
            "employee" => Ok(EntityType::Employee),
            "appointment" => Ok(EntityType::Appointment),
            "time_clock_entry" => Ok(EntityType::TimeClockEntry),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
