//! Generic repository: CRUD with sync markers plus the push pass.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use homebase_core::config::DEFAULT_PUSH_TIMEOUT_SECS;
use homebase_core::errors::{Error, NetworkError, RecordFailure, Result};
use homebase_core::models::{
    self, Door, Notification, Payment, Property, SyncEntity, SyncStatus, UnlockEvent, User,
    WorkOrder,
};
use homebase_core::net::RemoteApi;
use homebase_core::repository::{
    RepositoryId, RepositoryTrait, SyncOutcome, SyncRepositoryTrait,
};
use log::{debug, warn};

use crate::records::{Filter, StoredRecord};
use crate::store::Store;

pub type UserRepository = EntityRepository<User>;
pub type PropertyRepository = EntityRepository<Property>;
pub type WorkOrderRepository = EntityRepository<WorkOrder>;
pub type PaymentRepository = EntityRepository<Payment>;
pub type NotificationRepository = EntityRepository<Notification>;
pub type DoorRepository = EntityRepository<Door>;
pub type UnlockEventRepository = EntityRepository<UnlockEvent>;

/// Strictly later than `previous`, so every local write changes `updated_at`
/// and the compare-and-set in `mark_synced` can see it.
fn next_timestamp(previous: NaiveDateTime) -> NaiveDateTime {
    let now = models::now();
    let floor = previous + chrono::Duration::microseconds(1);
    now.max(floor)
}

/// One repository per entity type, each with its own identity.
pub struct EntityRepository<T> {
    id: RepositoryId,
    store: Store,
    remote: Arc<dyn RemoteApi>,
    push_timeout: Duration,
    _record: PhantomData<fn() -> T>,
}

impl<T: StoredRecord> EntityRepository<T> {
    pub fn new(store: Store, remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            id: RepositoryId::new(),
            store,
            remote,
            push_timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
            _record: PhantomData,
        }
    }

    pub fn with_push_timeout(mut self, push_timeout: Duration) -> Self {
        self.push_timeout = push_timeout;
        self
    }

    /// Every row including `deleted` ones awaiting acknowledgement.
    pub fn list_all(&self) -> Result<Vec<T>> {
        self.store.fetch::<T>(&Filter::All)
    }

    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.store.fetch::<T>(&Filter::unsynced())?.len())
    }

    async fn with_timeout<F>(&self, call: F) -> std::result::Result<(), NetworkError>
    where
        F: Future<Output = std::result::Result<(), NetworkError>>,
    {
        match tokio::time::timeout(self.push_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NetworkError::Timeout),
        }
    }

    async fn push_pending(&self, record: &T, id: i64, outcome: &mut SyncOutcome) {
        let payload = match serde_json::to_value(record) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("[Sync] Could not encode {:?} {}: {}", T::ENTITY, id, error);
                outcome
                    .failures
                    .push(RecordFailure::new(id, Error::Serialization(error)));
                return;
            }
        };
        if let Err(error) = self
            .with_timeout(self.remote.upsert(T::ENTITY, id, payload))
            .await
        {
            warn!("[Sync] Push of {:?} {} failed: {}", T::ENTITY, id, error);
            outcome.failures.push(RecordFailure::new(id, error));
            return;
        }

        let seen = record.updated_at();
        match self
            .store
            .transaction(move |conn| T::mark_synced(conn, id, seen))
            .await
        {
            Ok(true) => outcome.pushed.push(id),
            Ok(false) => debug!(
                "[Sync] {:?} {} changed during push; stays pending",
                T::ENTITY,
                id
            ),
            // The remote has the record; the next cycle re-pushes it as an upsert.
            Err(error) => {
                warn!(
                    "[Sync] {:?} {} pushed but not marked synced: {}",
                    T::ENTITY,
                    id,
                    error
                );
                outcome.failures.push(RecordFailure::new(id, error));
            }
        }
    }

    async fn push_delete(&self, id: i64, outcome: &mut SyncOutcome) {
        match self.with_timeout(self.remote.delete(T::ENTITY, id)).await {
            // Already gone remotely (or never pushed) counts as acknowledged.
            Ok(()) | Err(NetworkError::NotFound) => {
                match self
                    .store
                    .transaction(move |conn| T::purge_deleted(conn, id))
                    .await
                {
                    Ok(true) => outcome.purged.push(id),
                    Ok(false) => {}
                    Err(error) => {
                        warn!(
                            "[Sync] {:?} {} deleted remotely but not purged: {}",
                            T::ENTITY,
                            id,
                            error
                        );
                        outcome.failures.push(RecordFailure::new(id, error));
                    }
                }
            }
            Err(error) => {
                warn!("[Sync] Delete of {:?} {} failed: {}", T::ENTITY, id, error);
                outcome.failures.push(RecordFailure::new(id, error));
            }
        }
    }
}

#[async_trait]
impl<T: StoredRecord> SyncRepositoryTrait for EntityRepository<T> {
    fn repository_id(&self) -> RepositoryId {
        self.id
    }

    fn entity(&self) -> SyncEntity {
        T::ENTITY
    }

    async fn sync_pending_changes(&self) -> Result<SyncOutcome> {
        let mut outcome = SyncOutcome::new(T::ENTITY);
        let records = self.store.fetch::<T>(&Filter::unsynced())?;
        if records.is_empty() {
            return Ok(outcome);
        }
        debug!(
            "[Sync] {:?}: {} unsynced record(s)",
            T::ENTITY,
            records.len()
        );

        for record in &records {
            let Some(id) = record.id() else {
                continue;
            };
            match record.sync_status() {
                SyncStatus::Pending => self.push_pending(record, id, &mut outcome).await,
                SyncStatus::Deleted => self.push_delete(id, &mut outcome).await,
                SyncStatus::Synced => {}
            }
        }

        debug!(
            "[Sync] {:?}: pushed={} purged={} failed={}",
            T::ENTITY,
            outcome.pushed.len(),
            outcome.purged.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<T: StoredRecord> RepositoryTrait<T> for EntityRepository<T> {
    async fn get_current(&self) -> Result<Option<T>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .max_by_key(|record| record.updated_at()))
    }

    async fn save(&self, mut record: T) -> Result<T> {
        let now = next_timestamp(record.updated_at());
        record.stamp(SyncStatus::Pending, now);
        self.store.save(record).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.store
            .transaction(move |conn| {
                let Some(mut record) = T::load(conn, &Filter::Id(id))?.into_iter().next() else {
                    return Ok(false);
                };
                if record.sync_status() == SyncStatus::Deleted {
                    return Ok(false);
                }
                let now = next_timestamp(record.updated_at());
                record.stamp(SyncStatus::Deleted, now);
                T::upsert(conn, &record)?;
                Ok(true)
            })
            .await
    }

    async fn list(&self) -> Result<Vec<T>> {
        self.store.fetch::<T>(&Filter::live())
    }
}
