//! Error taxonomy shared by the storage, sync and session layers.

use thiserror::Error;

use crate::models::SyncEntity;

/// Result type alias for homebase operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the data layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Human readable message handed to the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(DatabaseError::NotFound(_)) => "The requested item was not found.".to_string(),
            Self::Database(_) => "Local storage is unavailable. Please restart the app.".to_string(),
            Self::Network(err) => err.user_message(),
            Self::Sync(SyncError::NetworkUnavailable) => {
                "You are offline. Changes will sync when you reconnect.".to_string()
            }
            Self::Sync(SyncError::SyncInProgress) => "A sync is already running.".to_string(),
            Self::Sync(_) => "Some changes could not be synced. They will be retried.".to_string(),
            Self::Session(SessionError::InvalidCredentials(message)) => message.clone(),
            Self::Session(SessionError::Network(err)) => err.user_message(),
            Self::Session(_) => "Please sign in again.".to_string(),
            Self::Serialization(_) => "Received data could not be read.".to_string(),
            Self::Config(_) => "The app is not configured correctly.".to_string(),
        }
    }
}

/// Storage engine failures. Returned to the calling repository, never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("Failed to initialize store: {0}")]
    InitializationFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Failed to create connection pool: {0}")]
    PoolCreationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Classified network failure.
///
/// The first three variants are transient and eligible for retry; everything else
/// is terminal for the current attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Cannot connect to host: {0}")]
    CannotConnect(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected status ({status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decoding(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl NetworkError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = body.chars().take(256).collect::<String>();
        match status {
            400 | 422 => Self::BadRequest(message),
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::ServerError { status, message },
            _ => Self::UnexpectedStatus { status, message },
        }
    }

    /// Whether the failure plausibly resolves on its own.
    ///
    /// HTTP responses are never transient here, including 5xx.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionLost(_) | Self::CannotConnect(_)
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::ServerError { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Timeout | Self::ConnectionLost(_) | Self::CannotConnect(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            Self::Unauthorized | Self::Forbidden => "Please sign in again.".to_string(),
            Self::ServerError { .. } => "The server had a problem. Try again later.".to_string(),
            _ => "Something went wrong talking to the server.".to_string(),
        }
    }
}

/// Sync cycle signals and failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No connectivity; no repository was touched.
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Another cycle is already running.
    #[error("Sync already in progress")]
    SyncInProgress,

    /// One or more repositories failed during the cycle.
    #[error("Sync partially failed ({} error(s))", .0.len())]
    PartialSyncFailure(Vec<Error>),

    /// A repository completed but some of its records were not acknowledged.
    #[error("{} {:?} record(s) failed to sync", .failures.len(), .entity)]
    RecordsFailed {
        entity: SyncEntity,
        failures: Vec<RecordFailure>,
    },

    /// A repository task panicked or was aborted before reporting.
    #[error("Sync task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    /// `NetworkUnavailable` and `SyncInProgress` are no-op signals rather than failures.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NetworkUnavailable | Self::SyncInProgress)
    }
}

/// Why a single record did not sync. Either the remote refused it or the
/// local bookkeeping after the remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Local store: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<Error> for RecordError {
    fn from(err: Error) -> Self {
        match err {
            Error::Database(e) => Self::Storage(e),
            Error::Network(e) => Self::Network(e),
            other => Self::Storage(DatabaseError::Internal(other.to_string())),
        }
    }
}

/// Per-record sync failure kept in a sync outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub record_id: i64,
    pub error: RecordError,
}

impl RecordFailure {
    pub fn new(record_id: i64, error: impl Into<RecordError>) -> Self {
        Self {
            record_id,
            error: error.into(),
        }
    }
}

/// Session and login failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Network(NetworkError),

    #[error("No session token available")]
    MissingToken,

    #[error("Login cancelled")]
    Cancelled,

    #[error("Secret store error: {0}")]
    SecretStore(String),
}
