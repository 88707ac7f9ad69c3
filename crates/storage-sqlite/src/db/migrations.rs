//! Versioned schema migrations tracked in `PRAGMA user_version`.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::SqliteConnection;
use homebase_core::errors::{DatabaseError, Error, Result};
use log::{debug, error, info};

use super::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;

/// One forward-only schema step. SQL must be idempotent (`IF NOT EXISTS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const CORE_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: include_str!("../../migrations/0001_initial_schema.sql"),
}];

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: i32,
    pub to_version: i32,
    pub applied: Vec<i32>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(QueryableByName)]
struct UserVersionRow {
    #[diesel(sql_type = Integer)]
    user_version: i32,
}

fn read_version(conn: &mut SqliteConnection) -> Result<i32> {
    let row = diesel::sql_query("PRAGMA user_version")
        .get_result::<UserVersionRow>(conn)
        .map_err(StorageError::from)?;
    Ok(row.user_version)
}

/// Schema version currently stored in the database.
pub fn current_version(pool: &DbPool) -> Result<i32> {
    let mut conn = get_connection(pool)?;
    read_version(&mut conn)
}

fn validate_steps(steps: &[Migration]) -> Result<()> {
    let ordered = steps.windows(2).all(|w| w[0].version < w[1].version);
    if !ordered || steps.iter().any(|m| m.version <= 0) {
        return Err(Error::Database(DatabaseError::MigrationFailed(
            "Migration versions must be positive and strictly increasing".to_string(),
        )));
    }
    Ok(())
}

/// Bring the schema up to `target_version`.
///
/// Pending steps and the version bump run in one write transaction, so a crash
/// mid-way leaves the previous version intact. The stored version is re-read
/// inside that transaction; a racing migrator finds nothing left to do.
pub async fn run_migrations(
    pool: &DbPool,
    writer: &WriteHandle,
    target_version: i32,
    steps: &'static [Migration],
) -> Result<MigrationReport> {
    validate_steps(steps)?;

    let stored = current_version(pool)?;
    if stored >= target_version {
        debug!(
            "[Store] Schema at version {} (target {}), nothing to migrate",
            stored, target_version
        );
        return Ok(MigrationReport {
            from_version: stored,
            to_version: stored,
            applied: Vec::new(),
        });
    }

    let report = writer
        .exec(move |conn| {
            let from_version = read_version(conn)?;
            if from_version >= target_version {
                return Ok(MigrationReport {
                    from_version,
                    to_version: from_version,
                    applied: Vec::new(),
                });
            }

            let mut applied = Vec::new();
            for step in steps
                .iter()
                .filter(|m| m.version > from_version && m.version <= target_version)
            {
                debug!("[Store] Applying migration {} ({})", step.version, step.name);
                conn.batch_execute(step.sql).map_err(|e| {
                    Error::Database(DatabaseError::MigrationFailed(format!(
                        "{} ({}): {}",
                        step.version, step.name, e
                    )))
                })?;
                applied.push(step.version);
            }

            conn.batch_execute(&format!("PRAGMA user_version = {}", target_version))
                .map_err(StorageError::from)?;

            Ok(MigrationReport {
                from_version,
                to_version: target_version,
                applied,
            })
        })
        .await
        .map_err(|e| {
            error!("[Store] Migration to version {} failed: {}", target_version, e);
            match e {
                Error::Database(DatabaseError::MigrationFailed(_)) => e,
                other => Error::Database(DatabaseError::MigrationFailed(other.to_string())),
            }
        })?;

    info!(
        "[Store] Migrated schema {} -> {} (applied {:?})",
        report.from_version, report.to_version, report.applied
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, spawn_writer};
    use diesel::sql_types::BigInt;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    #[derive(QueryableByName)]
    struct CountRow {
        #[diesel(sql_type = BigInt)]
        c: i64,
    }

    fn setup() -> (TempDir, Arc<DbPool>, WriteHandle) {
        let dir = tempdir().expect("tempdir");
        let path = init(dir.path().join("homebase.db")).expect("init");
        let pool = create_pool(&path).expect("pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (dir, pool, writer)
    }

    fn table_count(pool: &DbPool) -> i64 {
        let mut conn = get_connection(pool).expect("conn");
        diesel::sql_query(
            "SELECT COUNT(*) AS c FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .get_result::<CountRow>(&mut conn)
        .expect("count")
        .c
    }

    #[tokio::test]
    async fn migrating_twice_is_a_noop() {
        let (_dir, pool, writer) = setup();

        let first = run_migrations(&pool, &writer, CURRENT_SCHEMA_VERSION, CORE_MIGRATIONS)
            .await
            .expect("first migration");
        assert_eq!(first.from_version, 0);
        assert_eq!(first.to_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(first.applied, vec![1]);
        assert_eq!(table_count(&pool), 7);

        let second = run_migrations(&pool, &writer, CURRENT_SCHEMA_VERSION, CORE_MIGRATIONS)
            .await
            .expect("second migration");
        assert!(second.is_noop());
        assert_eq!(second.to_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(current_version(&pool).expect("version"), CURRENT_SCHEMA_VERSION);
        assert_eq!(table_count(&pool), 7);
    }

    #[tokio::test]
    async fn failing_step_keeps_previous_version() {
        static BROKEN: &[Migration] = &[
            Migration {
                version: 1,
                name: "initial_schema",
                sql: include_str!("../../migrations/0001_initial_schema.sql"),
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE extra (id INTEGER PRIMARY KEY); NOT VALID SQL;",
            },
        ];
        let (_dir, pool, writer) = setup();

        let result = run_migrations(&pool, &writer, 2, BROKEN).await;

        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::MigrationFailed(_)))
        ));
        assert_eq!(current_version(&pool).expect("version"), 0);
        assert_eq!(table_count(&pool), 0, "step 1 rolled back with step 2");
    }

    #[tokio::test]
    async fn lower_target_never_downgrades() {
        let (_dir, pool, writer) = setup();
        run_migrations(&pool, &writer, CURRENT_SCHEMA_VERSION, CORE_MIGRATIONS)
            .await
            .expect("migrate");

        let report = run_migrations(&pool, &writer, 0, CORE_MIGRATIONS)
            .await
            .expect("noop");
        assert!(report.is_noop());
        assert_eq!(current_version(&pool).expect("version"), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn unordered_steps_are_rejected() {
        let steps = [
            Migration {
                version: 2,
                name: "b",
                sql: "",
            },
            Migration {
                version: 1,
                name: "a",
                sql: "",
            },
        ];
        assert!(validate_steps(&steps).is_err());
        assert!(validate_steps(CORE_MIGRATIONS).is_ok());
    }
}
