use crate::application::ports::remote_client::RemoteTable;
use crate::application::ports::session::SessionProvider;
use crate::application::services::migration::MigrationService;
use crate::application::services::offline_queue::OfflineQueue;
use crate::application::services::syncer::EntitySyncer;
use crate::domain::entities::{
    Appointment, Customer, Employee, InventoryItem, Ticket, TimeClockEntry,
};
use crate::domain::value_objects::EntityType;
use crate::infrastructure::database::{
    ConnectionPool, SqliteLocalStore, SqliteQueueStore, SqliteSyncStateStore,
};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;

/// The remote backend, one table handle per entity type. Constructed by the
/// embedding application against whatever transport it uses.
pub struct RemoteTables {
    pub customers: Arc<dyn RemoteTable<Customer>>,
    pub tickets: Arc<dyn RemoteTable<Ticket>>,
    pub inventory: Arc<dyn RemoteTable<InventoryItem>>,
    pub employees: Arc<dyn RemoteTable<Employee>>,
    pub appointments: Arc<dyn RemoteTable<Appointment>>,
    pub time_clock: Arc<dyn RemoteTable<TimeClockEntry>>,
}

/// Fully wired sync subsystem: local stores, offline queue, one syncer per
/// entity type, and the migration orchestrator.
pub struct SyncEngine {
    pub pool: ConnectionPool,
    pub queue: Arc<OfflineQueue>,
    pub customers: Arc<EntitySyncer<Customer>>,
    pub tickets: Arc<EntitySyncer<Ticket>>,
    pub inventory: Arc<EntitySyncer<InventoryItem>>,
    pub employees: Arc<EntitySyncer<Employee>>,
    pub appointments: Arc<EntitySyncer<Appointment>>,
    pub time_clock: Arc<EntitySyncer<TimeClockEntry>>,
    pub migration: Arc<MigrationService>,
}

impl SyncEngine {
    pub async fn new(
        config: AppConfig,
        remote: RemoteTables,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Configuration)?;

        let pool = ConnectionPool::new(&config.database.url, config.database.max_connections)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        pool.migrate().await?;

        Self::with_pool(pool, config, remote, session).await
    }

    /// Wire against an already-migrated pool. Lets tests use an in-memory
    /// database.
    pub async fn with_pool(
        pool: ConnectionPool,
        config: AppConfig,
        remote: RemoteTables,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, AppError> {
        let local = Arc::new(SqliteLocalStore::new(pool.get_pool().clone()));
        let queue_store = Arc::new(SqliteQueueStore::new(pool.get_pool().clone()));
        let sync_state = Arc::new(SqliteSyncStateStore::new(pool.get_pool().clone()));

        let queue = Arc::new(OfflineQueue::new(queue_store, config.sync.clone()));

        // Parent-first dependency chain: tickets and appointments need their
        // customer remote-side, time clock entries need their employee.
        let customers = Arc::new(EntitySyncer::<Customer>::new(
            local.clone(),
            remote.customers,
            session.clone(),
            queue.clone(),
            sync_state.clone(),
            config.sync.clone(),
            None,
        ));
        let employees = Arc::new(EntitySyncer::<Employee>::new(
            local.clone(),
            remote.employees,
            session.clone(),
            queue.clone(),
            sync_state.clone(),
            config.sync.clone(),
            None,
        ));
        let tickets = Arc::new(EntitySyncer::<Ticket>::new(
            local.clone(),
            remote.tickets,
            session.clone(),
            queue.clone(),
            sync_state.clone(),
            config.sync.clone(),
            Some(customers.clone()),
        ));
        let inventory = Arc::new(EntitySyncer::<InventoryItem>::new(
            local.clone(),
            remote.inventory,
            session.clone(),
            queue.clone(),
            sync_state.clone(),
            config.sync.clone(),
            None,
        ));
        let appointments = Arc::new(EntitySyncer::<Appointment>::new(
            local.clone(),
            remote.appointments,
            session.clone(),
            queue.clone(),
            sync_state.clone(),
            config.sync.clone(),
            Some(customers.clone()),
        ));
        let time_clock = Arc::new(EntitySyncer::<TimeClockEntry>::new(
            local.clone(),
            remote.time_clock,
            session.clone(),
            queue.clone(),
            sync_state.clone(),
            config.sync.clone(),
            Some(employees.clone()),
        ));

        queue
            .register_handler(EntityType::Customer, customers.clone())
            .await;
        queue
            .register_handler(EntityType::Ticket, tickets.clone())
            .await;
        queue
            .register_handler(EntityType::InventoryItem, inventory.clone())
            .await;
        queue
            .register_handler(EntityType::Employee, employees.clone())
            .await;
        queue
            .register_handler(EntityType::Appointment, appointments.clone())
            .await;
        queue
            .register_handler(EntityType::TimeClockEntry, time_clock.clone())
            .await;

        let migration = Arc::new(MigrationService::new(
            employees.clone(),
            customers.clone(),
            inventory.clone(),
            tickets.clone(),
            session,
            sync_state,
            local,
            config,
        ));

        Ok(Self {
            pool,
            queue,
            customers,
            tickets,
            inventory,
            employees,
            appointments,
            time_clock,
            migration,
        })
    }

    /// Stop all realtime subscriptions and close the pool.
    pub async fn shutdown(&self) {
        self.customers.stop_realtime().await;
        self.tickets.stop_realtime().await;
        self.inventory.stop_realtime().await;
        self.employees.stop_realtime().await;
        self.appointments.stop_realtime().await;
        self.time_clock.stop_realtime().await;
        self.pool.close().await;
    }
}
