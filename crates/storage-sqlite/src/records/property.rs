use chrono::NaiveDateTime;
use diesel::prelude::*;
use homebase_core::errors::Error;
use homebase_core::models::{Property, SyncStatus};
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::properties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PropertyDB {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub address: String,
    pub unit: Option<String>,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::properties)]
#[diesel(treat_none_as_null = true)]
pub struct NewPropertyDB {
    pub id: Option<i64>,
    pub user_id: i64,
    pub name: String,
    pub address: String,
    pub unit: Option<String>,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<PropertyDB> for Property {
    type Error = Error;

    fn try_from(db: PropertyDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(db.id),
            user_id: db.user_id,
            name: db.name,
            address: db.address,
            unit: db.unit,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&Property> for NewPropertyDB {
    type Error = Error;

    fn try_from(property: &Property) -> Result<Self, Self::Error> {
        Ok(Self {
            id: property.id,
            user_id: property.user_id,
            name: property.name.clone(),
            address: property.address.clone(),
            unit: property.unit.clone(),
            sync_status: property.sync_status.as_str().to_string(),
            created_at: property.created_at,
            updated_at: property.updated_at,
        })
    }
}

impl_stored_record!(Property, PropertyDB, NewPropertyDB, properties, parent = user_id);
