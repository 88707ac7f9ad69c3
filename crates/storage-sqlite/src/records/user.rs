use chrono::NaiveDateTime;
use diesel::prelude::*;
use homebase_core::errors::Error;
use homebase_core::models::{SyncStatus, User};
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: i64,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct NewUserDB {
    pub id: Option<i64>,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<UserDB> for User {
    type Error = Error;

    fn try_from(db: UserDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(db.id),
            phone: db.phone,
            name: db.name,
            email: db.email,
            role: db.role,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&User> for NewUserDB {
    type Error = Error;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id,
            phone: user.phone.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            sync_status: user.sync_status.as_str().to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

impl_stored_record!(User, UserDB, NewUserDB, users);
