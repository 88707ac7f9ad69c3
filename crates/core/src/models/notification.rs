use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{impl_sync_record, SyncEntity, SyncStatus};

/// In-app notification addressed to a user, optionally about a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Option<i64>,
    pub user_id: i64,
    pub property_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl Notification {
    pub fn new(user_id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = super::now();
        Self {
            id: None,
            user_id,
            property_id: None,
            title: title.into(),
            body: body.into(),
            is_read: false,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(Notification, SyncEntity::Notification);
