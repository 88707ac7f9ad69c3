use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{impl_sync_record, SyncEntity, SyncStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Option<i64>,
    pub user_id: i64,
    pub name: String,
    pub address: String,
    pub unit: Option<String>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl Property {
    pub fn new(user_id: i64, name: impl Into<String>, address: impl Into<String>) -> Self {
        let now = super::now();
        Self {
            id: None,
            user_id,
            name: name.into(),
            address: address.into(),
            unit: None,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(Property, SyncEntity::Property);
