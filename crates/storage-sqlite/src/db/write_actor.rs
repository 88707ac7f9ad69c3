//! Single writer thread. Every mutation in the store is funnelled through here
//! so SQLite never sees two write transactions at once.

use std::panic::{catch_unwind, AssertUnwindSafe};

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use homebase_core::errors::{DatabaseError, Error, Result};
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use crate::errors::StorageError;

type Job = Box<dyn for<'a> FnOnce(std::result::Result<&'a mut SqliteConnection, Error>) + Send>;

/// Error carried out of a diesel transaction closure.
enum TxError {
    Job(Error),
    Diesel(diesel::result::Error),
    Panicked,
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

impl From<TxError> for Error {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Job(e) => e,
            TxError::Diesel(e) => StorageError::from(e).into(),
            TxError::Panicked => Error::Database(DatabaseError::Internal(
                "Write job panicked; transaction rolled back".to_string(),
            )),
        }
    }
}

/// Cloneable handle to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Run `job` inside an `IMMEDIATE` transaction on the writer thread.
    ///
    /// Commits iff `job` returns `Ok`. An `Err` or a panic rolls back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task: Job = Box::new(move |conn: std::result::Result<&mut SqliteConnection, Error>| {
            let result = conn.and_then(|conn| run_in_transaction(conn, job));
            let _ = reply_tx.send(result);
        });

        self.tx.send(task).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer thread has stopped".to_string(),
            ))
        })?;

        reply_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer dropped the job without replying".to_string(),
            ))
        })?
    }
}

fn run_in_transaction<F, T>(conn: &mut SqliteConnection, job: F) -> Result<T>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T>,
{
    conn.immediate_transaction::<T, TxError, _>(|conn| {
        match catch_unwind(AssertUnwindSafe(|| job(conn))) {
            Ok(result) => result.map_err(TxError::Job),
            Err(_) => Err(TxError::Panicked),
        }
    })
    .map_err(Error::from)
}

/// Spawn the writer thread. It exits once every handle is dropped.
pub fn spawn_writer(pool: Pool<ConnectionManager<SqliteConnection>>) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    std::thread::Builder::new()
        .name("homebase-db-writer".to_string())
        .spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(Ok(&mut *conn)),
                    Err(e) => {
                        error!("[Store] Writer could not acquire a connection: {}", e);
                        job(Err(StorageError::from(e).into()));
                    }
                }
            }
            debug!("[Store] Writer thread exiting");
        })
        .map(|_| ())
        .unwrap_or_else(|e| error!("[Store] Failed to spawn writer thread: {}", e));

    WriteHandle { tx }
}
