//! Connection setup: file location, pool, per-connection pragmas.

pub mod migrations;
pub mod write_actor;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::SqliteConnection;
use homebase_core::errors::{DatabaseError, Error, Result};
use log::{error, info};

use crate::errors::StorageError;

pub use migrations::{
    current_version, run_migrations, Migration, MigrationReport, CORE_MIGRATIONS,
    CURRENT_SCHEMA_VERSION,
};
pub use write_actor::{spawn_writer, WriteHandle};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        // foreign_keys is per connection and off by default; cascades depend on it.
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {};
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Resolve the database file path, creating parent directories.
pub fn init(db_path: impl AsRef<Path>) -> Result<PathBuf> {
    let db_path = db_path.as_ref().to_path_buf();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(StorageError::from)?;
    }
    Ok(db_path)
}

pub fn create_pool(db_path: impl AsRef<Path>) -> Result<Arc<DbPool>> {
    let db_path = db_path.as_ref();
    let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
    let pool = Pool::builder()
        .max_size(DEFAULT_POOL_SIZE)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }))
        .build(manager)
        .map_err(|e| {
            error!("[Store] Failed to open {}: {}", db_path.display(), e);
            Error::Database(DatabaseError::InitializationFailed(e.to_string()))
        })?;
    info!("[Store] Opened database at {}", db_path.display());
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))
}
