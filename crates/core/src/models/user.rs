use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{impl_sync_record, SyncEntity, SyncStatus};

/// Root entity: every other record hangs off a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<i64>,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn new(phone: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        let now = super::now();
        Self {
            id: None,
            phone: phone.into(),
            name: name.into(),
            email: None,
            role: role.into(),
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(User, SyncEntity::User);
