//! Row models and per-table query plumbing for each synced entity.

use chrono::NaiveDateTime;
use diesel::SqliteConnection;
use homebase_core::errors::{DatabaseError, Error, Result};
use homebase_core::models::{SyncRecord, SyncStatus};

/// Typed predicate accepted by `fetch`, `fetch_one` and `delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Id(i64),
    Ids(Vec<i64>),
    SyncStatus(SyncStatus),
    NotSyncStatus(SyncStatus),
    /// Rows owned by the given parent id (the table's owning foreign key).
    Parent(i64),
}

impl Filter {
    /// Rows visible to normal reads.
    pub fn live() -> Self {
        Filter::NotSyncStatus(SyncStatus::Deleted)
    }

    /// Rows the sync pass has to push.
    pub fn unsynced() -> Self {
        Filter::NotSyncStatus(SyncStatus::Synced)
    }
}

/// Table mapping for a domain record. All functions run on the caller's
/// connection, so they compose inside one transaction.
pub trait StoredRecord: SyncRecord + Sized {
    /// Insert when `id` is `None`, otherwise insert-or-overwrite the full row.
    fn upsert(conn: &mut SqliteConnection, record: &Self) -> Result<Self>;

    fn load(conn: &mut SqliteConnection, filter: &Filter) -> Result<Vec<Self>>;

    /// Hard delete. Foreign-key cascades apply.
    fn remove(conn: &mut SqliteConnection, filter: &Filter) -> Result<usize>;

    /// `pending → synced`, only if the row still carries `seen_updated_at`.
    fn mark_synced(
        conn: &mut SqliteConnection,
        id: i64,
        seen_updated_at: NaiveDateTime,
    ) -> Result<bool>;

    /// Remove a row whose delete the remote acknowledged, if still `deleted`.
    fn purge_deleted(conn: &mut SqliteConnection, id: i64) -> Result<bool>;
}

pub(crate) fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

pub(crate) fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_str(&format!("\"{}\"", value)).map_err(|_| {
        Error::Database(DatabaseError::Internal(format!(
            "Unexpected stored value '{}'",
            value
        )))
    })
}

macro_rules! impl_stored_record {
    ($record:ty, $row:ty, $new_row:ty, $table:ident $(, parent = $parent:ident)?) => {
        impl $crate::records::StoredRecord for $record {
            fn upsert(
                conn: &mut diesel::SqliteConnection,
                record: &Self,
            ) -> homebase_core::Result<Self> {
                use diesel::prelude::*;
                use $crate::schema::$table;

                let row = <$new_row>::try_from(record)?;
                let saved = diesel::insert_into($table::table)
                    .values(&row)
                    .on_conflict($table::id)
                    .do_update()
                    .set(&row)
                    .returning(<$row>::as_returning())
                    .get_result::<$row>(conn)
                    .map_err($crate::errors::StorageError::from)?;
                Self::try_from(saved)
            }

            fn load(
                conn: &mut diesel::SqliteConnection,
                filter: &$crate::records::Filter,
            ) -> homebase_core::Result<Vec<Self>> {
                use diesel::prelude::*;
                use $crate::records::Filter;
                use $crate::schema::$table;

                let query = $table::table.select(<$row>::as_select()).into_boxed();
                let query = match filter {
                    Filter::All => query,
                    Filter::Id(id) => query.filter($table::id.eq(*id)),
                    Filter::Ids(ids) => query.filter($table::id.eq_any(ids.clone())),
                    Filter::SyncStatus(status) => {
                        query.filter($table::sync_status.eq(status.as_str()))
                    }
                    Filter::NotSyncStatus(status) => {
                        query.filter($table::sync_status.ne(status.as_str()))
                    }
                    $(Filter::Parent(parent_id) => query.filter($table::$parent.eq(*parent_id)),)?
                    #[allow(unreachable_patterns)]
                    Filter::Parent(_) => {
                        return Err(homebase_core::Error::Database(
                            homebase_core::errors::DatabaseError::QueryFailed(format!(
                                "{} has no parent relation",
                                stringify!($table)
                            )),
                        ))
                    }
                };

                let rows = query
                    .order($table::id.asc())
                    .load::<$row>(conn)
                    .map_err($crate::errors::StorageError::from)?;
                rows.into_iter().map(Self::try_from).collect()
            }

            fn remove(
                conn: &mut diesel::SqliteConnection,
                filter: &$crate::records::Filter,
            ) -> homebase_core::Result<usize> {
                use diesel::prelude::*;
                use $crate::schema::$table;

                let ids = match filter {
                    $crate::records::Filter::Id(id) => vec![*id],
                    other => Self::load(conn, other)?
                        .iter()
                        .filter_map(<Self as homebase_core::models::SyncRecord>::id)
                        .collect(),
                };
                if ids.is_empty() {
                    return Ok(0);
                }
                let removed = diesel::delete($table::table.filter($table::id.eq_any(ids)))
                    .execute(conn)
                    .map_err($crate::errors::StorageError::from)?;
                Ok(removed)
            }

            fn mark_synced(
                conn: &mut diesel::SqliteConnection,
                id: i64,
                seen_updated_at: chrono::NaiveDateTime,
            ) -> homebase_core::Result<bool> {
                use diesel::prelude::*;
                use homebase_core::models::SyncStatus;
                use $crate::schema::$table;

                let updated = diesel::update(
                    $table::table
                        .filter($table::id.eq(id))
                        .filter($table::sync_status.eq(SyncStatus::Pending.as_str()))
                        .filter($table::updated_at.eq(seen_updated_at)),
                )
                .set($table::sync_status.eq(SyncStatus::Synced.as_str()))
                .execute(conn)
                .map_err($crate::errors::StorageError::from)?;
                Ok(updated > 0)
            }

            fn purge_deleted(
                conn: &mut diesel::SqliteConnection,
                id: i64,
            ) -> homebase_core::Result<bool> {
                use diesel::prelude::*;
                use homebase_core::models::SyncStatus;
                use $crate::schema::$table;

                let removed = diesel::delete(
                    $table::table
                        .filter($table::id.eq(id))
                        .filter($table::sync_status.eq(SyncStatus::Deleted.as_str())),
                )
                .execute(conn)
                .map_err($crate::errors::StorageError::from)?;
                Ok(removed > 0)
            }
        }
    };
}

mod door;
mod notification;
mod payment;
mod property;
mod user;
mod work_order;

pub use door::{DoorDB, NewDoorDB, NewUnlockEventDB, UnlockEventDB};
pub use notification::{NewNotificationDB, NotificationDB};
pub use payment::{NewPaymentDB, PaymentDB};
pub use property::{NewPropertyDB, PropertyDB};
pub use user::{NewUserDB, UserDB};
pub use work_order::{NewWorkOrderDB, WorkOrderDB};
