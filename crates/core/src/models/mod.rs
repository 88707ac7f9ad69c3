//! Domain records persisted locally and pushed to the remote service.

mod sync_marker;
mod user;
mod property;
mod work_order;
mod payment;
mod notification;
mod door;

pub use door::{Door, UnlockEvent, UnlockMethod};
pub use notification::Notification;
pub use payment::{Payment, PaymentStatus};
pub use property::Property;
pub use sync_marker::{SyncEntity, SyncRecord, SyncStatus};
pub(crate) use sync_marker::impl_sync_record;
pub use user::User;
pub use work_order::{WorkOrder, WorkOrderPriority, WorkOrderStatus};

/// Current UTC wall clock as stored in `created_at`/`updated_at`.
pub fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
