//! Network boundary consumed by the data layer.
//!
//! TLS trust, proxies and connection pooling are the transport's concern; the
//! data layer only sees request/response semantics.

mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportErrorKind,
};

use async_trait::async_trait;

use crate::errors::NetworkError;
use crate::models::SyncEntity;

/// Remote API surface used by repositories to push local changes.
///
/// The remote must treat a repeated upsert of the same identifier as an
/// update, which is what makes a retried push safe.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn upsert(
        &self,
        entity: SyncEntity,
        id: i64,
        payload: serde_json::Value,
    ) -> Result<(), NetworkError>;

    async fn delete(&self, entity: SyncEntity, id: i64) -> Result<(), NetworkError>;
}

/// Authenticated context handed to remote clients.
pub trait AuthContext: Send + Sync {
    /// Bearer token of the current session, if authenticated.
    fn access_token(&self) -> Option<String>;

    /// Called when an authenticated request found the token invalid or expired.
    fn invalidate(&self);
}
