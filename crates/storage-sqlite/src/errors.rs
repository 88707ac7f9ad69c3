//! Storage-level failures and their mapping onto the core taxonomy.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use homebase_core::errors::{DatabaseError, Error};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query error: {0}")]
    Query(#[from] DieselError),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db_err = match err {
            StorageError::Query(DieselError::NotFound) => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            StorageError::Query(DieselError::DatabaseError(kind, info)) => match kind {
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => {
                    DatabaseError::SaveFailed(info.message().to_string())
                }
                _ => DatabaseError::QueryFailed(info.message().to_string()),
            },
            StorageError::Query(other) => DatabaseError::QueryFailed(other.to_string()),
            StorageError::Connection(e) => DatabaseError::InitializationFailed(e.to_string()),
            StorageError::Pool(e) => DatabaseError::PoolCreationFailed(e.to_string()),
            StorageError::Io(e) => DatabaseError::InitializationFailed(e.to_string()),
        };
        Error::Database(db_err)
    }
}
