use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{impl_sync_record, SyncEntity, SyncStatus};

/// Smart-lock door belonging to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Door {
    pub id: Option<i64>,
    pub property_id: i64,
    pub name: String,
    pub lock_identifier: String,
    pub is_locked: bool,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl Door {
    pub fn new(property_id: i64, name: impl Into<String>, lock_identifier: impl Into<String>) -> Self {
        let now = super::now();
        Self {
            id: None,
            property_id,
            name: name.into(),
            lock_identifier: lock_identifier.into(),
            is_locked: true,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(Door, SyncEntity::Door);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMethod {
    #[default]
    App,
    Keypad,
    Remote,
}

/// Audit entry recording who unlocked a door and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockEvent {
    pub id: Option<i64>,
    pub door_id: i64,
    pub user_id: i64,
    pub method: UnlockMethod,
    pub unlocked_at: NaiveDateTime,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl UnlockEvent {
    pub fn new(door_id: i64, user_id: i64, method: UnlockMethod) -> Self {
        let now = super::now();
        Self {
            id: None,
            door_id,
            user_id,
            method,
            unlocked_at: now,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(UnlockEvent, SyncEntity::UnlockEvent);
