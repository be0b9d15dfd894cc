pub mod connection_pool;
pub mod local_store;
pub mod mappers;
pub mod queue_store;
pub mod rows;
pub mod sync_state_store;

pub use connection_pool::ConnectionPool;
pub use local_store::SqliteLocalStore;
pub use queue_store::SqliteQueueStore;
pub use sync_state_store::SqliteSyncStateStore;
