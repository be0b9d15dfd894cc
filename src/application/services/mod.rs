pub mod migration;
pub mod offline_queue;
pub mod syncer;

pub use migration::{MigrationOptions, MigrationService, MigrationStatus};
pub use offline_queue::{DrainOutcome, OfflineQueue, OperationHandler, QueueCounts};
pub use syncer::{BatchOutcome, DependencyUploader, EntitySyncer, MergeOutcome};
