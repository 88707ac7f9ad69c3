use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{impl_sync_record, SyncEntity, SyncStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Due,
    Paid,
    Overdue,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Option<i64>,
    pub property_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDateTime>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "super::now")]
    pub created_at: NaiveDateTime,
    #[serde(default = "super::now")]
    pub updated_at: NaiveDateTime,
}

impl Payment {
    pub fn new(
        property_id: i64,
        user_id: i64,
        amount: Decimal,
        currency: impl Into<String>,
        due_date: NaiveDate,
    ) -> Self {
        let now = super::now();
        Self {
            id: None,
            property_id,
            user_id,
            amount,
            currency: currency.into(),
            due_date,
            paid_at: None,
            status: PaymentStatus::Due,
            sync_status: SyncStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_sync_record!(Payment, SyncEntity::Payment);
