use crate::application::ports::session::{FixedSessionProvider, SessionProvider};
use crate::application::services::offline_queue::OfflineQueue;
use crate::application::services::syncer::EntitySyncer;
use crate::application::shared::tests::mocks::MockRemoteTable;
use crate::domain::entities::{Customer, Employee, InventoryItem, Ticket};
use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::{Role, ShopId};
use crate::infrastructure::database::{
    ConnectionPool, SqliteLocalStore, SqliteQueueStore, SqliteSyncStateStore,
};
use crate::shared::config::SyncConfig;
use std::sync::Arc;

pub async fn memory_pool() -> ConnectionPool {
    // VACUUM INTO (BackupStore) writes through the connection's VFS, so an
    // in-memory pool would produce no file on disk; back the test pool with
    // a throwaway file instead.
    let dir = std::env::temp_dir().join(format!("protech-sync-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}/test.db?mode=rwc", dir.display());
    let pool = ConnectionPool::new(&url, 1).await.unwrap();
    pool.migrate().await.unwrap();
    pool
}

/// Fast retries so tests never wait on real backoff windows.
pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        max_retry: 3,
        batch_size: 2,
        backoff_base_secs: 0,
        request_timeout_secs: 5,
    }
}

pub fn customer(shop_id: ShopId) -> Customer {
    Customer::new(shop_id, "Ada".to_string(), "Lovelace".to_string())
}

pub fn employee(shop_id: ShopId) -> Employee {
    Employee::new(
        shop_id,
        "Grace".to_string(),
        "Hopper".to_string(),
        Role::Technician,
    )
}

pub fn inventory_item(shop_id: ShopId) -> InventoryItem {
    InventoryItem::new(shop_id, "iPhone 12 screen".to_string(), 10, 7999)
}

pub fn ticket(shop_id: ShopId, customer_id: uuid::Uuid, number: i64) -> Ticket {
    Ticket::new(
        shop_id,
        customer_id,
        number,
        "iPhone".to_string(),
        "Cracked screen".to_string(),
    )
}

/// One entity type wired end to end against an in-memory database and a mock
/// remote.
pub struct SyncHarness<E: SyncRecord> {
    pub pool: ConnectionPool,
    pub local: Arc<SqliteLocalStore>,
    pub remote: Arc<MockRemoteTable<E>>,
    pub queue: Arc<OfflineQueue>,
    pub syncer: Arc<EntitySyncer<E>>,
    pub shop_id: ShopId,
}

impl<E: SyncRecord> SyncHarness<E>
where
    SqliteLocalStore: crate::application::ports::repositories::LocalRepository<E>,
{
    pub async fn new() -> Self {
        Self::with_config(test_sync_config()).await
    }

    pub async fn with_config(config: SyncConfig) -> Self {
        let shop_id = ShopId::generate();
        Self::for_shop(shop_id, config).await
    }

    pub async fn for_shop(session_shop: ShopId, config: SyncConfig) -> Self {
        let pool = memory_pool().await;
        let local = Arc::new(SqliteLocalStore::new(pool.get_pool().clone()));
        let queue_store = Arc::new(SqliteQueueStore::new(pool.get_pool().clone()));
        let sync_state = Arc::new(SqliteSyncStateStore::new(pool.get_pool().clone()));
        let remote = Arc::new(MockRemoteTable::<E>::new());
        let session: Arc<dyn SessionProvider> =
            Arc::new(FixedSessionProvider::new(session_shop, Role::Admin));

        let queue = Arc::new(OfflineQueue::new(queue_store, config.clone()));
        let syncer = Arc::new(EntitySyncer::<E>::new(
            local.clone(),
            remote.clone(),
            session,
            queue.clone(),
            sync_state,
            config,
            None,
        ));
        queue
            .register_handler(E::ENTITY_TYPE, syncer.clone())
            .await;

        Self {
            pool,
            local,
            remote,
            queue,
            syncer,
            shop_id: session_shop,
        }
    }
}
