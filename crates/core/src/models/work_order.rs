use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{impl_sync_record, SyncEntity, SyncStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Maintenance request against a property, optionally assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Option<i64>,
    pub property_id: i64,
    pub assigned_to: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl WorkOrder {
    pub fn new(property_id: i64, title: impl Into<String>) -> Self {
        let now = super::now();
        Self {
            id: None,
            property_id,
            assigned_to: None,
            title: title.into(),
            description: None,
            status: WorkOrderStatus::Open,
            priority: WorkOrderPriority::Normal,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(WorkOrder, SyncEntity::WorkOrder);
