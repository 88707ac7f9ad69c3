use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use homebase_core::errors::{DatabaseError, Error};
use homebase_core::models::{Payment, SyncStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{enum_from_db, enum_to_db};

// `amount` is TEXT so decimals survive without float rounding.
#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentDB {
    pub id: i64,
    pub property_id: i64,
    pub user_id: i64,
    pub amount: String,
    pub currency: String,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDateTime>,
    pub status: String,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(treat_none_as_null = true)]
pub struct NewPaymentDB {
    pub id: Option<i64>,
    pub property_id: i64,
    pub user_id: i64,
    pub amount: String,
    pub currency: String,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDateTime>,
    pub status: String,
    pub sync_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<PaymentDB> for Payment {
    type Error = Error;

    fn try_from(db: PaymentDB) -> Result<Self, Self::Error> {
        let amount = Decimal::from_str(&db.amount).map_err(|e| {
            Error::Database(DatabaseError::Internal(format!(
                "Invalid amount '{}' on payment {}: {}",
                db.amount, db.id, e
            )))
        })?;
        Ok(Self {
            id: Some(db.id),
            property_id: db.property_id,
            user_id: db.user_id,
            amount,
            currency: db.currency,
            due_date: db.due_date,
            paid_at: db.paid_at,
            status: enum_from_db(&db.status)?,
            sync_status: db.sync_status.parse::<SyncStatus>()?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl TryFrom<&Payment> for NewPaymentDB {
    type Error = Error;

    fn try_from(payment: &Payment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: payment.id,
            property_id: payment.property_id,
            user_id: payment.user_id,
            amount: payment.amount.to_string(),
            currency: payment.currency.clone(),
            due_date: payment.due_date,
            paid_at: payment.paid_at,
            status: enum_to_db(&payment.status)?,
            sync_status: payment.sync_status.as_str().to_string(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        })
    }
}

impl_stored_record!(Payment, PaymentDB, NewPaymentDB, payments, parent = property_id);
