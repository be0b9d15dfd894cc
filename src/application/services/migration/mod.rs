use crate::application::ports::report_store::{BackupStore, ReportStore};
use crate::application::ports::repositories::LocalRepository;
use crate::application::ports::session::SessionProvider;
use crate::application::services::syncer::EntitySyncer;
use crate::domain::entities::{
    Customer, Employee, InventoryItem, MigrationError, MigrationPhase, MigrationReport,
    MigrationStatistics, Ticket, LAST_MIGRATION_REPORT,
};
use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::{CloudSyncStatus, EntityType, ShopId};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;


#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub migrate_employees: bool,
    pub migrate_customers: bool,
    pub migrate_inventory: bool,
    pub migrate_tickets: bool,
    /// Skip records already marked Synced, making re-runs resumable.
    pub skip_existing: bool,
    /// Collect per-record errors and keep going instead of aborting.
    pub continue_on_error: bool,
    /// Route uploads through chunked batch upserts.
    pub use_batch_operations: bool,
    /// Snapshot the local store before mutating anything.
    pub create_backup: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            migrate_employees: true,
            migrate_customers: true,
            migrate_inventory: true,
            migrate_tickets: true,
            skip_existing: true,
            continue_on_error: true,
            use_batch_operations: true,
            create_backup: true,
        }
    }
}

/// Snapshot of the orchestrator's observable state, polled by the UI.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub is_migrating: bool,
    pub phase: MigrationPhase,
    /// total_migrated / total_records, in [0, 1].
    pub progress: f64,
    pub status_message: String,
    pub statistics: MigrationStatistics,
    pub errors: Vec<MigrationError>,
    pub backup_path: Option<String>,
}

impl Default for MigrationStatus {
    fn default() -> Self {
        Self {
            is_migrating: false,
            phase: MigrationPhase::Idle,
            progress: 0.0,
            status_message: String::new(),
            statistics: MigrationStatistics::default(),
            errors: Vec::new(),
            backup_path: None,
        }
    }
}

enum PhaseControl {
    Continue,
    /// Connectivity lost or operator cancel; the run stops without entering
    /// the Failed phase and can be restarted from the same point.
    Pause(String),
}

/// One-shot (resumable) bulk transfer of the entire local dataset to the
/// remote: employees, then customers, then inventory, then tickets, then a
/// verification pass. Rollback is a pure local-state reset.
pub struct MigrationService {
    employees: Arc<EntitySyncer<Employee>>,
    customers: Arc<EntitySyncer<Customer>>,
    inventory: Arc<EntitySyncer<InventoryItem>>,
    tickets: Arc<EntitySyncer<Ticket>>,
    session: Arc<dyn SessionProvider>,
    reports: Arc<dyn ReportStore>,
    backup: Arc<dyn BackupStore>,
    config: AppConfig,
    status: Arc<RwLock<MigrationStatus>>,
    cancel_requested: AtomicBool,
}

impl MigrationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        employees: Arc<EntitySyncer<Employee>>,
        customers: Arc<EntitySyncer<Customer>>,
        inventory: Arc<EntitySyncer<InventoryItem>>,
        tickets: Arc<EntitySyncer<Ticket>>,
        session: Arc<dyn SessionProvider>,
        reports: Arc<dyn ReportStore>,
        backup: Arc<dyn BackupStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            employees,
            customers,
            inventory,
            tickets,
            session,
            reports,
            backup,
            config,
            status: Arc::new(RwLock::new(MigrationStatus::default())),
            cancel_requested: AtomicBool::new(false),
        }
    }

    pub async fn status(&self) -> MigrationStatus {
        self.status.read().await.clone()
    }

    pub async fn is_migrating(&self) -> bool {
        self.status.read().await.is_migrating
    }

    /// Request a stop. Takes effect at the next record/chunk boundary, never
    /// mid-write.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub async fn clear_errors(&self) {
        self.status.write().await.errors.clear();
    }

    pub async fn last_report(&self) -> Result<Option<MigrationReport>, AppError> {
        let payload = self.reports.load_report(LAST_MIGRATION_REPORT).await?;
        match payload {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Reset every record's sync status to Pending so the next run
    /// re-attempts everything. Remote data is untouched; the backend upsert
    /// is idempotent on id, so there is nothing to retract.
    pub async fn rollback_migration(&self) -> Result<u64, AppError> {
        {
            let status = self.status.read().await;
            if status.is_migrating {
                return Err(AppError::Conflict(
                    "cannot roll back while a migration is running".to_string(),
                ));
            }
        }

        let shop_id = self.require_shop_id()?;
        let mut touched = 0u64;
        touched += self.employees.local().mark_all_pending(&shop_id).await?;
        touched += self.customers.local().mark_all_pending(&shop_id).await?;
        touched += self.inventory.local().mark_all_pending(&shop_id).await?;
        touched += self.tickets.local().mark_all_pending(&shop_id).await?;

        let mut status = self.status.write().await;
        status.phase = MigrationPhase::Idle;
        status.progress = 0.0;
        status.statistics = MigrationStatistics::default();
        status.status_message = format!("Rolled back {touched} records to pending");
        tracing::info!(touched, "migration rollback complete");
        Ok(touched)
    }

    pub async fn start_migration(
        &self,
        options: MigrationOptions,
    ) -> Result<MigrationReport, AppError> {
        {
            let mut status = self.status.write().await;
            if status.is_migrating {
                return Err(AppError::Conflict(
                    "migration already in progress".to_string(),
                ));
            }
            status.is_migrating = true;
            status.phase = MigrationPhase::Preparing;
            status.progress = 0.0;
            status.statistics = MigrationStatistics {
                started_at: Some(Utc::now()),
                ..MigrationStatistics::default()
            };
            status.status_message = "Preparing migration".to_string();
        }
        self.cancel_requested.store(false, Ordering::SeqCst);

        let result = self.run(&options).await;

        let report = self.finish(result).await?;
        Ok(report)
    }

    fn require_shop_id(&self) -> Result<ShopId, AppError> {
        self.session
            .current_shop_id()
            .ok_or_else(|| AppError::PermissionDenied("no active session".to_string()))
    }

    async fn run(&self, options: &MigrationOptions) -> Result<PhaseControl, AppError> {
        let shop_id = self.require_shop_id()?;

        // Preparing: totals per entity type, plus the optional snapshot
        // before anything is mutated.
        if options.create_backup {
            let path = self
                .backup
                .create_backup(&self.config.migration.backup_dir)
                .await?;
            tracing::info!(path = %path, "local store backed up");
            self.status.write().await.backup_path = Some(path);
        }

        let employee_total = self
            .phase_total(&self.employees, &shop_id, options, options.migrate_employees)
            .await?;
        let customer_total = self
            .phase_total(&self.customers, &shop_id, options, options.migrate_customers)
            .await?;
        let inventory_total = self
            .phase_total(&self.inventory, &shop_id, options, options.migrate_inventory)
            .await?;
        let ticket_total = self
            .phase_total(&self.tickets, &shop_id, options, options.migrate_tickets)
            .await?;

        {
            let mut status = self.status.write().await;
            status.statistics.employees.total = employee_total;
            status.statistics.customers.total = customer_total;
            status.statistics.inventory.total = inventory_total;
            status.statistics.tickets.total = ticket_total;
        }

        // Validating: shape-check every eligible record up front; invalid
        // records are recorded and excluded from their phase.
        self.set_phase(MigrationPhase::Validating, "Validating records")
            .await;
        let mut invalid = HashSet::new();
        if options.migrate_employees {
            self.validate_phase(&self.employees, &shop_id, options, &mut invalid)
                .await?;
        }
        if options.migrate_customers {
            self.validate_phase(&self.customers, &shop_id, options, &mut invalid)
                .await?;
        }
        if options.migrate_inventory {
            self.validate_phase(&self.inventory, &shop_id, options, &mut invalid)
                .await?;
        }
        if options.migrate_tickets {
            self.validate_phase(&self.tickets, &shop_id, options, &mut invalid)
                .await?;
        }
        if !options.continue_on_error && !invalid.is_empty() {
            return Err(AppError::Validation(format!(
                "{} records failed validation",
                invalid.len()
            )));
        }

        // Entity phases, fixed order.
        if options.migrate_employees {
            if let PhaseControl::Pause(reason) = self
                .run_phase(
                    MigrationPhase::MigratingEmployees,
                    &self.employees,
                    &shop_id,
                    options,
                    &invalid,
                )
                .await?
            {
                return Ok(PhaseControl::Pause(reason));
            }
        }
        if options.migrate_customers {
            if let PhaseControl::Pause(reason) = self
                .run_phase(
                    MigrationPhase::MigratingCustomers,
                    &self.customers,
                    &shop_id,
                    options,
                    &invalid,
                )
                .await?
            {
                return Ok(PhaseControl::Pause(reason));
            }
        }
        if options.migrate_inventory {
            if let PhaseControl::Pause(reason) = self
                .run_phase(
                    MigrationPhase::MigratingInventory,
                    &self.inventory,
                    &shop_id,
                    options,
                    &invalid,
                )
                .await?
            {
                return Ok(PhaseControl::Pause(reason));
            }
        }
        if options.migrate_tickets {
            if let PhaseControl::Pause(reason) = self
                .run_phase(
                    MigrationPhase::MigratingTickets,
                    &self.tickets,
                    &shop_id,
                    options,
                    &invalid,
                )
                .await?
            {
                return Ok(PhaseControl::Pause(reason));
            }
        }

        // Verifying: nothing eligible may remain Pending.
        self.set_phase(MigrationPhase::Verifying, "Verifying migrated records")
            .await;
        let mut remaining = 0u64;
        if options.migrate_employees {
            remaining += self
                .employees
                .local()
                .count_with_status(&shop_id, CloudSyncStatus::Pending)
                .await?;
        }
        if options.migrate_customers {
            remaining += self
                .customers
                .local()
                .count_with_status(&shop_id, CloudSyncStatus::Pending)
                .await?;
        }
        if options.migrate_inventory {
            remaining += self
                .inventory
                .local()
                .count_with_status(&shop_id, CloudSyncStatus::Pending)
                .await?;
        }
        if options.migrate_tickets {
            remaining += self
                .tickets
                .local()
                .count_with_status(&shop_id, CloudSyncStatus::Pending)
                .await?;
        }
        if remaining > 0 {
            self.record_error(
                MigrationPhase::Verifying,
                None,
                format!("{remaining} records still pending after migration"),
            )
            .await;
            if !options.continue_on_error {
                return Err(AppError::Validation(format!(
                    "verification failed: {remaining} records still pending"
                )));
            }
        }

        Ok(PhaseControl::Continue)
    }

    /// Close out the run: set the terminal phase, persist the report, and
    /// release the `is_migrating` guard.
    async fn finish(
        &self,
        result: Result<PhaseControl, AppError>,
    ) -> Result<MigrationReport, AppError> {
        let outcome = match result {
            Ok(PhaseControl::Continue) => {
                let mut status = self.status.write().await;
                status.phase = MigrationPhase::Completed;
                status.statistics.finished_at = Some(Utc::now());
                status.status_message = format!(
                    "Migration complete: {} migrated, {} failed",
                    status.statistics.total_migrated(),
                    status.statistics.total_failed()
                );
                Ok(())
            }
            Ok(PhaseControl::Pause(reason)) => {
                let mut status = self.status.write().await;
                // Phase intentionally left where it stopped so a restart
                // resumes from the same point.
                status.status_message = format!("Migration paused: {reason}");
                Ok(())
            }
            Err(err) => {
                let mut status = self.status.write().await;
                if err.is_retryable() {
                    status.status_message = format!("Migration paused: {err}");
                } else {
                    status.phase = MigrationPhase::Failed;
                    status.statistics.finished_at = Some(Utc::now());
                    status.status_message = format!("Migration failed: {err}");
                }
                Err(err)
            }
        };

        let report = {
            let status = self.status.read().await;
            MigrationReport {
                phase: status.phase,
                statistics: status.statistics.clone(),
                errors: status.errors.clone(),
            }
        };
        self.reports
            .save_report(LAST_MIGRATION_REPORT, &serde_json::to_value(&report)?)
            .await?;

        self.status.write().await.is_migrating = false;

        match outcome {
            Ok(()) => Ok(report),
            Err(err) => Err(err),
        }
    }

    async fn phase_total<E: SyncRecord>(
        &self,
        syncer: &Arc<EntitySyncer<E>>,
        shop_id: &ShopId,
        options: &MigrationOptions,
        included: bool,
    ) -> Result<u64, AppError> {
        if !included {
            return Ok(0);
        }
        let records = self.eligible_records(syncer, shop_id, options).await?;
        Ok(records.len() as u64)
    }

    async fn eligible_records<E: SyncRecord>(
        &self,
        syncer: &Arc<EntitySyncer<E>>,
        shop_id: &ShopId,
        options: &MigrationOptions,
    ) -> Result<Vec<E>, AppError> {
        let records = syncer.local().list_all(shop_id).await?;
        Ok(records
            .into_iter()
            .filter(|r| !options.skip_existing || r.sync_status() != CloudSyncStatus::Synced)
            .collect())
    }

    async fn validate_phase<E: SyncRecord>(
        &self,
        syncer: &Arc<EntitySyncer<E>>,
        shop_id: &ShopId,
        options: &MigrationOptions,
        invalid: &mut HashSet<Uuid>,
    ) -> Result<(), AppError> {
        let records = self.eligible_records(syncer, shop_id, options).await?;
        for record in &records {
            if let Err(message) = record.validate() {
                invalid.insert(record.id());
                self.record_error(MigrationPhase::Validating, Some(record.id()), message)
                    .await;
                let mut counters = self.status.write().await;
                counters.statistics.counters_mut(E::ENTITY_TYPE).failed += 1;
            }
        }
        Ok(())
    }

    async fn run_phase<E: SyncRecord>(
        &self,
        phase: MigrationPhase,
        syncer: &Arc<EntitySyncer<E>>,
        shop_id: &ShopId,
        options: &MigrationOptions,
        invalid: &HashSet<Uuid>,
    ) -> Result<PhaseControl, AppError> {
        self.set_phase(phase, &format!("Migrating {}s", E::ENTITY_TYPE.as_str()))
            .await;

        let records: Vec<E> = self
            .eligible_records(syncer, shop_id, options)
            .await?
            .into_iter()
            .filter(|r| !invalid.contains(&r.id()))
            .collect();

        if options.use_batch_operations {
            let chunk_size = self.config.sync.batch_size.max(1) as usize;
            for chunk in records.chunks(chunk_size) {
                if self.cancel_requested.load(Ordering::SeqCst) {
                    return Ok(PhaseControl::Pause("cancelled by operator".to_string()));
                }
                match syncer.upload_chunk_direct(chunk).await {
                    Ok(()) => {
                        self.bump_migrated(E::ENTITY_TYPE, chunk.len() as u64).await;
                    }
                    Err(err) if err.is_retryable() => {
                        // Processed records stay Synced; the run can restart
                        // from this phase.
                        return Ok(PhaseControl::Pause(err.to_string()));
                    }
                    Err(err) => {
                        for record in chunk {
                            self.record_error(phase, Some(record.id()), err.to_string())
                                .await;
                            let mut failed = record.clone();
                            failed.set_sync_status(CloudSyncStatus::Failed);
                            syncer.local().save(&failed).await?;
                        }
                        self.bump_failed(E::ENTITY_TYPE, chunk.len() as u64).await;
                        if !options.continue_on_error {
                            return Err(err);
                        }
                    }
                }
            }
        } else {
            for record in &records {
                if self.cancel_requested.load(Ordering::SeqCst) {
                    return Ok(PhaseControl::Pause("cancelled by operator".to_string()));
                }
                match syncer.upload_direct(record).await {
                    Ok(()) => self.bump_migrated(E::ENTITY_TYPE, 1).await,
                    Err(err) if err.is_retryable() => {
                        return Ok(PhaseControl::Pause(err.to_string()));
                    }
                    Err(err) => {
                        self.record_error(phase, Some(record.id()), err.to_string())
                            .await;
                        self.bump_failed(E::ENTITY_TYPE, 1).await;
                        if !options.continue_on_error {
                            return Err(err);
                        }
                    }
                }
            }
        }

        Ok(PhaseControl::Continue)
    }

    async fn set_phase(&self, phase: MigrationPhase, message: &str) {
        let mut status = self.status.write().await;
        status.phase = phase;
        status.status_message = message.to_string();
        tracing::info!(phase = phase.as_str(), "{message}");
    }

    async fn record_error(&self, phase: MigrationPhase, entity_id: Option<Uuid>, message: String) {
        tracing::warn!(phase = phase.as_str(), ?entity_id, "{message}");
        self.status.write().await.errors.push(MigrationError {
            timestamp: Utc::now(),
            phase,
            entity_id,
            message,
        });
    }

    async fn bump_migrated(&self, entity_type: EntityType, count: u64) {
        let mut status = self.status.write().await;
        status.statistics.counters_mut(entity_type).migrated += count;
        let total = status.statistics.total_records();
        if total > 0 {
            status.progress = status.statistics.total_migrated() as f64 / total as f64;
        }
    }

    async fn bump_failed(&self, entity_type: EntityType, count: u64) {
        let mut status = self.status.write().await;
        status.statistics.counters_mut(entity_type).failed += count;
    }
}
