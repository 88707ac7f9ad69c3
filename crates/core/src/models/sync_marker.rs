use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{DatabaseError, Error};

/// Per-record sync marker.
///
/// A `deleted` record is excluded from normal reads and purged once the remote
/// acknowledges the delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    #[default]
    Pending,
    Deleted,
}

impl SyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "synced" => Ok(Self::Synced),
            "pending" => Ok(Self::Pending),
            "deleted" => Ok(Self::Deleted),
            other => Err(Error::Database(DatabaseError::Internal(format!(
                "Unknown sync status '{}'",
                other
            )))),
        }
    }
}

/// Entity types that participate in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEntity {
    User,
    Property,
    WorkOrder,
    Payment,
    Notification,
    Door,
    UnlockEvent,
}

impl SyncEntity {
    pub const ALL: [SyncEntity; 7] = [
        SyncEntity::User,
        SyncEntity::Property,
        SyncEntity::WorkOrder,
        SyncEntity::Payment,
        SyncEntity::Notification,
        SyncEntity::Door,
        SyncEntity::UnlockEvent,
    ];

    /// Local table backing this entity.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Property => "properties",
            Self::WorkOrder => "work_orders",
            Self::Payment => "payments",
            Self::Notification => "notifications",
            Self::Door => "doors",
            Self::UnlockEvent => "unlock_events",
        }
    }

    /// Path segment of the remote endpoint for this entity.
    pub const fn api_path(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Property => "properties",
            Self::WorkOrder => "work-orders",
            Self::Payment => "payments",
            Self::Notification => "notifications",
            Self::Door => "doors",
            Self::UnlockEvent => "unlock-events",
        }
    }
}

/// Common contract of every persisted domain record.
pub trait SyncRecord: Clone + Serialize + Send + Sync + 'static {
    const ENTITY: SyncEntity;

    /// Store-assigned identifier, `None` until first insert.
    fn id(&self) -> Option<i64>;

    fn sync_status(&self) -> SyncStatus;

    fn updated_at(&self) -> NaiveDateTime;

    /// Set the marker and timestamps ahead of a local write.
    fn stamp(&mut self, status: SyncStatus, now: NaiveDateTime);
}

macro_rules! impl_sync_record {
    ($record:ty, $entity:expr) => {
        impl $crate::models::SyncRecord for $record {
            const ENTITY: $crate::models::SyncEntity = $entity;

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn sync_status(&self) -> $crate::models::SyncStatus {
                self.sync_status
            }

            fn updated_at(&self) -> chrono::NaiveDateTime {
                self.updated_at
            }

            fn stamp(&mut self, status: $crate::models::SyncStatus, now: chrono::NaiveDateTime) {
                if self.id.is_none() {
                    self.created_at = now;
                }
                self.updated_at = now;
                self.sync_status = status;
            }
        }
    };
}

pub(crate) use impl_sync_record;
