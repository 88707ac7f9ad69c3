//! SQLite storage engine for the homebase data layer.
//!
//! diesel over an r2d2 pool for reads, one writer thread for all writes,
//! schema versions in `PRAGMA user_version`.

pub mod db;
pub mod errors;
pub mod records;
pub mod repository;
pub mod schema;
pub mod store;

pub use db::{MigrationReport, WriteHandle, CORE_MIGRATIONS, CURRENT_SCHEMA_VERSION};
pub use errors::StorageError;
pub use records::{Filter, StoredRecord};
pub use repository::{
    DoorRepository, EntityRepository, NotificationRepository, PaymentRepository,
    PropertyRepository, UnlockEventRepository, UserRepository, WorkOrderRepository,
};
pub use store::Store;
