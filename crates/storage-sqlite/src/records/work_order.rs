use chrono::NaiveDateTime;
use diesel::prelude::*;
use homebase_core::errors::Error;
use homebase_core::models::{SyncStatus, WorkOrder};
use serde::{Deserialize, Serialize};

use super::{enum_from_db, enum_to_db};

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::work_orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkOrderDB {
    pub id: i64,
    pub property_id: i64,
    pub assigned_to: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::work_orders)]
#[diesel(treat_none_as_null = true)]
pub struct NewWorkOrderDB {
    pub id: Option<i64>,
    pub property_id: i64,
    pub assigned_to: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<WorkOrderDB> for WorkOrder {
    type Error = Error;

    fn try_from(db: WorkOrderDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(db.id),
            property_id: db.property_id,
            assigned_to: db.assigned_to,
            title: db.title,
            description: db.description,
            status: enum_from_db(&db.status)?,
            priority: enum_from_db(&db.priority)?,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&WorkOrder> for NewWorkOrderDB {
    type Error = Error;

    fn try_from(order: &WorkOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            id: order.id,
            property_id: order.property_id,
            assigned_to: order.assigned_to,
            title: order.title.clone(),
            description: order.description.clone(),
            status: enum_to_db(&order.status)?,
            priority: enum_to_db(&order.priority)?,
            sync_status: order.sync_status.as_str().to_string(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

impl_stored_record!(WorkOrder, WorkOrderDB, NewWorkOrderDB, work_orders, parent = property_id);
