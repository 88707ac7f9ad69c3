use chrono::NaiveDateTime;
use diesel::prelude::*;
use homebase_core::errors::Error;
use homebase_core::models::{Door, SyncStatus, UnlockEvent};
use serde::{Deserialize, Serialize};

use super::{enum_from_db, enum_to_db};

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::doors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DoorDB {
    pub id: i64,
    pub property_id: i64,
    pub name: String,
    pub lock_identifier: String,
    pub is_locked: bool,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::doors)]
#[diesel(treat_none_as_null = true)]
pub struct NewDoorDB {
    pub id: Option<i64>,
    pub property_id: i64,
    pub name: String,
    pub lock_identifier: String,
    pub is_locked: bool,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<DoorDB> for Door {
    type Error = Error;

    fn try_from(db: DoorDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(db.id),
            property_id: db.property_id,
            name: db.name,
            lock_identifier: db.lock_identifier,
            is_locked: db.is_locked,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&Door> for NewDoorDB {
    type Error = Error;

    fn try_from(door: &Door) -> Result<Self, Self::Error> {
        Ok(Self {
            id: door.id,
            property_id: door.property_id,
            name: door.name.clone(),
            lock_identifier: door.lock_identifier.clone(),
            is_locked: door.is_locked,
            sync_status: door.sync_status.as_str().to_string(),
            created_at: door.created_at,
            updated_at: door.updated_at,
        })
    }
}

impl_stored_record!(Door, DoorDB, NewDoorDB, doors, parent = property_id);

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::unlock_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UnlockEventDB {
    pub id: i64,
    pub door_id: i64,
    pub user_id: i64,
    pub method: String,
    pub unlocked_at: NaiveDateTime,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::unlock_events)]
#[diesel(treat_none_as_null = true)]
pub struct NewUnlockEventDB {
    pub id: Option<i64>,
    pub door_id: i64,
    pub user_id: i64,
    pub method: String,
    pub unlocked_at: NaiveDateTime,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<UnlockEventDB> for UnlockEvent {
    type Error = Error;

    fn try_from(db: UnlockEventDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(db.id),
            door_id: db.door_id,
            user_id: db.user_id,
            method: enum_from_db(&db.method)?,
            unlocked_at: db.unlocked_at,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&UnlockEvent> for NewUnlockEventDB {
    type Error = Error;

    fn try_from(event: &UnlockEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            id: event.id,
            door_id: event.door_id,
            user_id: event.user_id,
            method: enum_to_db(&event.method)?,
            unlocked_at: event.unlocked_at,
            sync_status: event.sync_status.as_str().to_string(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        })
    }
}

impl_stored_record!(
    UnlockEvent,
    UnlockEventDB,
    NewUnlockEventDB,
    unlock_events,
    parent = door_id
);
