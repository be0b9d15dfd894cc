use crate::application::ports::remote_client::{RemoteChange, RemoteFeed, RemoteTable};
use crate::domain::sync::SyncRecord;
use crate::domain::value_objects::ShopId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Failure injected into every remote call until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailure {
    Connectivity,
    PermissionDenied,
    Validation,
}

/// In-memory stand-in for one remote table. Counts calls so tests can assert
/// that guarded paths produce zero network traffic.
pub struct MockRemoteTable<E: SyncRecord> {
    rows: Mutex<HashMap<Uuid, E>>,
    failure: Mutex<Option<RemoteFailure>>,
    feed_tx: Mutex<Option<mpsc::UnboundedSender<RemoteChange<E>>>>,
    // Runs on every write call; lets a test flip external state (cancel a
    // migration, cut connectivity) while a run is in flight.
    on_write: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    pub upsert_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub select_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl<E: SyncRecord> Default for MockRemoteTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SyncRecord> MockRemoteTable<E> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            feed_tx: Mutex::new(None),
            on_write: Mutex::new(None),
            upsert_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            select_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failure(&self, failure: Option<RemoteFailure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn set_on_write(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_write.lock().unwrap() = Some(Box::new(hook));
    }

    fn fire_on_write(&self) {
        if let Some(hook) = self.on_write.lock().unwrap().as_ref() {
            hook();
        }
    }

    pub fn seed(&self, records: Vec<E>) {
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.insert(record.id(), record);
        }
    }

    pub fn row(&self, id: Uuid) -> Option<E> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
            + self.batch_calls.load(Ordering::SeqCst)
            + self.select_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
    }

    /// Push a change down the open realtime feed. Panics if nothing has
    /// subscribed yet.
    pub fn push_change(&self, change: RemoteChange<E>) {
        let guard = self.feed_tx.lock().unwrap();
        let tx = guard.as_ref().expect("no realtime subscriber");
        tx.send(change).expect("feed receiver dropped");
    }

    fn check_failure(&self) -> Result<(), AppError> {
        match *self.failure.lock().unwrap() {
            None => Ok(()),
            Some(RemoteFailure::Connectivity) => {
                Err(AppError::Connectivity("remote unreachable".to_string()))
            }
            Some(RemoteFailure::PermissionDenied) => Err(AppError::PermissionDenied(
                "row-level policy rejected the write".to_string(),
            )),
            Some(RemoteFailure::Validation) => Err(AppError::Validation(
                "remote rejected the payload".to_string(),
            )),
        }
    }
}

#[async_trait]
impl<E: SyncRecord> RemoteTable<E> for MockRemoteTable<E> {
    async fn upsert(&self, record: &E) -> Result<(), AppError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.fire_on_write();
        self.check_failure()?;
        self.rows
            .lock()
            .unwrap()
            .insert(record.id(), record.clone());
        Ok(())
    }

    async fn upsert_batch(&self, records: &[E]) -> Result<(), AppError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.fire_on_write();
        self.check_failure()?;
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.insert(record.id(), record.clone());
        }
        Ok(())
    }

    async fn select_updated_since(
        &self,
        shop_id: &ShopId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<E>, AppError> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let rows = self.rows.lock().unwrap();
        let mut matched: Vec<E> = rows
            .values()
            .filter(|r| r.shop_id() == *shop_id)
            .filter(|r| since.map_or(true, |s| r.updated_at() > s))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.updated_at());
        Ok(matched)
    }

    async fn delete(&self, _shop_id: &ShopId, id: Uuid) -> Result<(), AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(record) = rows.get_mut(&id) {
            record.set_deleted_at(Some(Utc::now()));
        }
        Ok(())
    }

    async fn count(&self, shop_id: &ShopId) -> Result<u64, AppError> {
        self.check_failure()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.shop_id() == *shop_id && r.deleted_at().is_none())
            .count() as u64)
    }

    async fn subscribe(&self, _shop_id: &ShopId) -> Result<RemoteFeed<E>, AppError> {
        self.check_failure()?;
        let (tx, rx) = mpsc::unbounded_channel();
        *self.feed_tx.lock().unwrap() = Some(tx);
        Ok(RemoteFeed { receiver: rx })
    }
}
