use chrono::NaiveDateTime;
use diesel::prelude::*;
use homebase_core::errors::Error;
use homebase_core::models::{Notification, SyncStatus};
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NotificationDB {
    pub id: i64,
    pub user_id: i64,
    pub property_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(treat_none_as_null = true)]
pub struct NewNotificationDB {
    pub id: Option<i64>,
    pub user_id: i64,
    pub property_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<NotificationDB> for Notification {
    type Error = Error;

    fn try_from(db: NotificationDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(db.id),
            user_id: db.user_id,
            property_id: db.property_id,
            title: db.title,
            body: db.body,
            is_read: db.is_read,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&Notification> for NewNotificationDB {
    type Error = Error;

    fn try_from(notification: &Notification) -> Result<Self, Self::Error> {
        Ok(Self {
            id: notification.id,
            user_id: notification.user_id,
            property_id: notification.property_id,
            title: notification.title.clone(),
            body: notification.body.clone(),
            is_read: notification.is_read,
            sync_status: notification.sync_status.as_str().to_string(),
            created_at: notification.created_at,
            updated_at: notification.updated_at,
        })
    }
}

impl_stored_record!(
    Notification,
    NotificationDB,
    NewNotificationDB,
    notifications,
    parent = user_id
);
