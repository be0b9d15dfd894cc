pub mod appointment;
pub mod customer;
pub mod employee;
pub mod inventory_item;
pub mod migration_report;
pub mod sync_operation;
pub mod ticket;
pub mod time_clock_entry;

pub use appointment::Appointment;
pub use customer::Customer;
pub use employee::Employee;
pub use inventory_item::InventoryItem;
pub use migration_report::{
    EntityCounters, MigrationError, MigrationPhase, MigrationReport, MigrationStatistics,
    LAST_MIGRATION_REPORT,
};
pub use sync_operation::{NewSyncOperation, SyncOperation};
pub use ticket::{Ticket, TicketStatus};
pub use time_clock_entry::TimeClockEntry;
