use crate::domain::value_objects::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed phase order of a bulk migration run. `Failed` is reachable from any
/// step on a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Idle,
    Preparing,
    Validating,
    MigratingEmployees,
    MigratingCustomers,
    MigratingInventory,
    MigratingTickets,
    Verifying,
    Completed,
    Failed,
}

impl MigrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationPhase::Idle => "idle",
            MigrationPhase::Preparing => "preparing",
            MigrationPhase::Validating => "validating",
            MigrationPhase::MigratingEmployees => "migrating_employees",
            MigrationPhase::MigratingCustomers => "migrating_customers",
            MigrationPhase::MigratingInventory => "migrating_inventory",
            MigrationPhase::MigratingTickets => "migrating_tickets",
            MigrationPhase::Verifying => "verifying",
            MigrationPhase::Completed => "completed",
            MigrationPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationPhase::Completed | MigrationPhase::Failed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounters {
    pub total: u64,
    pub migrated: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationStatistics {
    pub employees: EntityCounters,
    pub customers: EntityCounters,
    pub inventory: EntityCounters,
    pub tickets: EntityCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationStatistics {
    pub fn counters(&self, entity_type: EntityType) -> EntityCounters {
        match entity_type {
            EntityType::Employee => self.employees,
            EntityType::Customer => self.customers,
            EntityType::InventoryItem => self.inventory,
            EntityType::Ticket => self.tickets,
            _ => EntityCounters::default(),
        }
    }

    pub fn counters_mut(&mut self, entity_type: EntityType) -> &mut EntityCounters {
        match entity_type {
            EntityType::Employee => &mut self.employees,
            EntityType::Customer => &mut self.customers,
            EntityType::InventoryItem => &mut self.inventory,
            EntityType::Ticket => &mut self.tickets,
            other => unreachable!("entity type {other} does not participate in migration"),
        }
    }

    pub fn total_records(&self) -> u64 {
        self.employees.total + self.customers.total + self.inventory.total + self.tickets.total
    }

    pub fn total_migrated(&self) -> u64 {
        self.employees.migrated
            + self.customers.migrated
            + self.inventory.migrated
            + self.tickets.migrated
    }

    pub fn total_failed(&self) -> u64 {
        self.employees.failed + self.customers.failed + self.inventory.failed + self.tickets.failed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationError {
    pub timestamp: DateTime<Utc>,
    pub phase: MigrationPhase,
    pub entity_id: Option<Uuid>,
    pub message: String,
}

/// Persisted after each run under a well-known report name so "view last
/// report" works across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub phase: MigrationPhase,
    pub statistics: MigrationStatistics,
    pub errors: Vec<MigrationError>,
}

pub const LAST_MIGRATION_REPORT: &str = "last_migration_report";
