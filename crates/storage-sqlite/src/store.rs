//! Transactional CRUD over the record tables.

use std::path::Path;
use std::sync::Arc;

use diesel::SqliteConnection;
use homebase_core::errors::{DatabaseError, Error, Result};
use log::error;

use crate::db::{
    self, get_connection, run_migrations, spawn_writer, DbPool, Migration, MigrationReport,
    WriteHandle, CORE_MIGRATIONS, CURRENT_SCHEMA_VERSION,
};
use crate::records::{Filter, StoredRecord};

/// Single-writer, multi-reader handle to the on-disk store.
///
/// Reads run on pooled connections. Writes queue on the writer thread, one
/// `IMMEDIATE` transaction at a time. Cloning shares both.
#[derive(Clone)]
pub struct Store {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

fn reclassify(err: Error, as_kind: fn(String) -> DatabaseError) -> Error {
    match err {
        Error::Database(DatabaseError::QueryFailed(message)) => Error::Database(as_kind(message)),
        other => other,
    }
}

impl Store {
    /// Open (creating if absent) the store at `path`.
    ///
    /// Failure here is fatal for the caller; nothing is retried.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = db::init(path)?;
        let pool = db::create_pool(&path)?;
        // Surface unusable files now rather than on first query.
        get_connection(&pool).map_err(|e| {
            error!("[Store] Could not open {}: {}", path.display(), e);
            Error::Database(DatabaseError::InitializationFailed(e.to_string()))
        })?;
        let writer = spawn_writer(pool.as_ref().clone());
        Ok(Self { pool, writer })
    }

    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    pub fn writer(&self) -> &WriteHandle {
        &self.writer
    }

    pub async fn migrate(
        &self,
        target_version: i32,
        steps: &'static [Migration],
    ) -> Result<MigrationReport> {
        run_migrations(&self.pool, &self.writer, target_version, steps).await
    }

    /// Apply the schema shipped with this crate.
    pub async fn migrate_to_latest(&self) -> Result<MigrationReport> {
        self.migrate(CURRENT_SCHEMA_VERSION, CORE_MIGRATIONS).await
    }

    /// Insert, or overwrite the full row when the record already has an id.
    pub async fn save<R: StoredRecord>(&self, record: R) -> Result<R> {
        self.writer
            .exec(move |conn| R::upsert(conn, &record))
            .await
            .map_err(|e| reclassify(e, DatabaseError::SaveFailed))
    }

    /// Save every record in one transaction; all or nothing.
    pub async fn save_all<R: StoredRecord>(&self, records: Vec<R>) -> Result<Vec<R>> {
        if records.is_empty() {
            return Ok(records);
        }
        self.writer
            .exec(move |conn| {
                records
                    .iter()
                    .map(|record| R::upsert(conn, record))
                    .collect::<Result<Vec<_>>>()
            })
            .await
            .map_err(|e| reclassify(e, DatabaseError::SaveFailed))
    }

    pub fn fetch<R: StoredRecord>(&self, filter: &Filter) -> Result<Vec<R>> {
        let mut conn = get_connection(&self.pool)?;
        R::load(&mut conn, filter)
    }

    /// First match, or `NotFound`.
    pub fn fetch_one<R: StoredRecord>(&self, filter: &Filter) -> Result<R> {
        self.fetch::<R>(filter)?.into_iter().next().ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "No {} matching {:?}",
                R::ENTITY.table_name(),
                filter
            )))
        })
    }

    /// Hard delete; returns the number of rows removed from `R`'s table.
    pub async fn delete<R: StoredRecord>(&self, filter: Filter) -> Result<usize> {
        self.writer
            .exec(move |conn| R::remove(conn, &filter))
            .await
            .map_err(|e| reclassify(e, DatabaseError::DeleteFailed))
    }

    /// Run `work` exactly once in a write transaction; commits iff it returns `Ok`.
    pub async fn transaction<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.writer.exec(work).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use homebase_core::models::{
        Door, Payment, Property, SyncRecord, SyncStatus, UnlockEvent, UnlockMethod, User,
        WorkOrder,
    };
    use rust_decimal_macros::dec;
    use tempfile::{tempdir, TempDir};

    async fn setup() -> (TempDir, Store) {
        let dir = tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("homebase.db")).expect("open store");
        store.migrate_to_latest().await.expect("migrate");
        (dir, store)
    }

    async fn seed_user(store: &Store, phone: &str) -> User {
        store
            .save(User::new(phone, "Ana", "tenant"))
            .await
            .expect("save user")
    }

    #[tokio::test]
    async fn save_assigns_id_and_overwrites_full_row() {
        let (_dir, store) = setup().await;
        let mut user = User::new("+15550100", "Ana", "tenant");
        user.email = Some("ana@example.com".to_string());

        let saved = store.save(user).await.expect("insert");
        let id = saved.id.expect("id assigned");

        let mut edited = saved.clone();
        edited.name = "Ana Maria".to_string();
        edited.email = None;
        store.save(edited).await.expect("overwrite");

        let loaded: User = store.fetch_one(&Filter::Id(id)).expect("fetch");
        assert_eq!(loaded.name, "Ana Maria");
        assert_eq!(loaded.email, None, "no partial merge");
        assert_eq!(store.fetch::<User>(&Filter::All).expect("all").len(), 1);
    }

    #[tokio::test]
    async fn save_all_is_atomic() {
        let (_dir, store) = setup().await;
        let user = seed_user(&store, "+1").await;
        let good = Property::new(user.id.expect("id"), "Loft", "1 Main St");
        let orphan = Property::new(9_999, "Nowhere", "0 Void Rd");

        let result = store.save_all(vec![good, orphan]).await;

        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::SaveFailed(_)))
        ));
        assert!(store.fetch::<Property>(&Filter::All).expect("fetch").is_empty());
    }

    #[tokio::test]
    async fn fetch_filters_by_status_and_parent() {
        let (_dir, store) = setup().await;
        let owner = seed_user(&store, "+1").await;
        let other = seed_user(&store, "+2").await;
        let owner_id = owner.id.expect("id");

        let mut synced = Property::new(owner_id, "A", "1 Main St");
        synced.sync_status = SyncStatus::Synced;
        store
            .save_all(vec![
                synced,
                Property::new(owner_id, "B", "2 Main St"),
                Property::new(other.id.expect("id"), "C", "3 Main St"),
            ])
            .await
            .expect("save");

        let owned = store
            .fetch::<Property>(&Filter::Parent(owner_id))
            .expect("by parent");
        assert_eq!(owned.len(), 2);

        let pending = store
            .fetch::<Property>(&Filter::SyncStatus(SyncStatus::Pending))
            .expect("pending");
        assert_eq!(pending.len(), 2);

        let unsynced = store.fetch::<Property>(&Filter::unsynced()).expect("unsynced");
        assert!(unsynced.iter().all(|p| p.sync_status() != SyncStatus::Synced));

        assert!(store.fetch::<User>(&Filter::Parent(owner_id)).is_err());
    }

    #[tokio::test]
    async fn fetch_one_reports_not_found() {
        let (_dir, store) = setup().await;
        let result = store.fetch_one::<Door>(&Filter::Id(42));
        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn deleting_property_cascades_to_dependents() {
        let (_dir, store) = setup().await;
        let user = seed_user(&store, "+1").await;
        let user_id = user.id.expect("id");
        let property = store
            .save(Property::new(user_id, "Loft", "1 Main St"))
            .await
            .expect("property");
        let property_id = property.id.expect("id");

        store
            .save(WorkOrder::new(property_id, "Fix sink"))
            .await
            .expect("work order");
        store
            .save(Payment::new(
                property_id,
                user_id,
                dec!(1250.00),
                "USD",
                NaiveDate::from_ymd_opt(2026, 11, 1).expect("date"),
            ))
            .await
            .expect("payment");
        let door = store
            .save(Door::new(property_id, "Front", "lock-1"))
            .await
            .expect("door");
        store
            .save(UnlockEvent::new(door.id.expect("id"), user_id, UnlockMethod::App))
            .await
            .expect("unlock event");

        let removed = store
            .delete::<Property>(Filter::Id(property_id))
            .await
            .expect("delete");

        assert_eq!(removed, 1);
        assert!(store.fetch::<WorkOrder>(&Filter::All).expect("orders").is_empty());
        assert!(store.fetch::<Payment>(&Filter::All).expect("payments").is_empty());
        assert!(store.fetch::<Door>(&Filter::All).expect("doors").is_empty());
        assert!(store
            .fetch::<UnlockEvent>(&Filter::All)
            .expect("events")
            .is_empty());
        assert_eq!(store.fetch::<User>(&Filter::All).expect("users").len(), 1);
    }

    #[tokio::test]
    async fn deleting_assignee_clears_work_order_assignment() {
        let (_dir, store) = setup().await;
        let owner = seed_user(&store, "+1").await;
        let tech = seed_user(&store, "+2").await;
        let property = store
            .save(Property::new(owner.id.expect("id"), "Loft", "1 Main St"))
            .await
            .expect("property");
        let mut order = WorkOrder::new(property.id.expect("id"), "Fix sink");
        order.assigned_to = tech.id;
        let order = store.save(order).await.expect("order");

        store
            .delete::<User>(Filter::Id(tech.id.expect("id")))
            .await
            .expect("delete tech");

        let reloaded: WorkOrder = store
            .fetch_one(&Filter::Id(order.id.expect("id")))
            .expect("order survives");
        assert_eq!(reloaded.assigned_to, None);
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_error() {
        let (_dir, store) = setup().await;
        let user = seed_user(&store, "+1").await;
        let property = Property::new(user.id.expect("id"), "Loft", "1 Main St");

        let result: Result<()> = store
            .transaction(move |conn| {
                Property::upsert(conn, &property)?;
                Err(Error::Config("abort".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert!(store.fetch::<Property>(&Filter::All).expect("fetch").is_empty());
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_panic() {
        let (_dir, store) = setup().await;
        let user = seed_user(&store, "+1").await;
        let property = Property::new(user.id.expect("id"), "Loft", "1 Main St");

        let result: Result<()> = store
            .transaction(move |conn| {
                Property::upsert(conn, &property)?;
                panic!("boom");
            })
            .await;

        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::Internal(_)))
        ));
        assert!(store.fetch::<Property>(&Filter::All).expect("fetch").is_empty());

        // The writer survives the panic.
        seed_user(&store, "+2").await;
        assert_eq!(store.fetch::<User>(&Filter::All).expect("users").len(), 2);
    }

    #[tokio::test]
    async fn concurrent_writes_are_serialized() {
        let (_dir, store) = setup().await;
        let handles = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .save(User::new(format!("+1555{:04}", i), "User", "tenant"))
                        .await
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.await.expect("join").expect("save");
        }
        assert_eq!(store.fetch::<User>(&Filter::All).expect("users").len(), 20);
    }
}
