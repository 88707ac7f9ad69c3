//! Repository capability contracts.
//!
//! One implementation per entity type. The orchestrator only sees the
//! object-safe [`SyncRepositoryTrait`]; callers doing CRUD use [`RepositoryTrait`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{RecordFailure, Result};
use crate::models::{SyncEntity, SyncRecord};

/// Identity of a repository instance, minted at construction.
///
/// The orchestrator's registry dedups on this handle, so two repositories for
/// the same entity type are still distinct registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(Uuid);

impl RepositoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RepositoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of pushing one repository's pending changes.
///
/// Partial progress is kept: acknowledged records are listed even when
/// others failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub entity: SyncEntity,
    /// Records pushed and marked `synced`.
    pub pushed: Vec<i64>,
    /// Records whose remote delete was acknowledged and were purged locally.
    pub purged: Vec<i64>,
    /// Records that keep their marker and are retried next cycle.
    pub failures: Vec<RecordFailure>,
}

impl SyncOutcome {
    pub fn new(entity: SyncEntity) -> Self {
        Self {
            entity,
            pushed: Vec::new(),
            purged: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn processed(&self) -> usize {
        self.pushed.len() + self.purged.len() + self.failures.len()
    }
}

/// Sync half of the repository contract.
#[async_trait]
pub trait SyncRepositoryTrait: Send + Sync {
    fn repository_id(&self) -> RepositoryId;

    fn entity(&self) -> SyncEntity;

    /// Push every record whose marker is not `synced`.
    ///
    /// Idempotent: a retry after partial failure re-pushes the same
    /// identifiers, which the remote upserts.
    async fn sync_pending_changes(&self) -> Result<SyncOutcome>;
}

/// CRUD half of the repository contract. Mutations set the sync marker.
#[async_trait]
pub trait RepositoryTrait<T: SyncRecord>: SyncRepositoryTrait {
    /// Most recently updated live record.
    async fn get_current(&self) -> Result<Option<T>>;

    /// Insert or fully overwrite; the stored record is `pending`.
    async fn save(&self, record: T) -> Result<T>;

    /// Mark a record `deleted`. Returns `false` when no live record has `id`.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All live records.
    async fn list(&self) -> Result<Vec<T>>;
}
