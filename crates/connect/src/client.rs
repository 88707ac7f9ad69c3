//! Remote API client used by the repositories to push local changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use homebase_core::errors::NetworkError;
use homebase_core::models::SyncEntity;
use homebase_core::net::{AuthContext, HttpRequest, HttpResponse, HttpTransport, RemoteApi};
use log::{debug, warn};

use crate::error::{normalize_base_url, Result};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bearer-authenticated client for `{base}/api/{entity}/{id}` endpoints.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    auth: Arc<dyn AuthContext>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthContext>,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            base_url: normalize_base_url(base_url)?,
            auth,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, entity: SyncEntity, id: i64) -> String {
        format!("{}/api/{}/{}", self.base_url, entity.api_path(), id)
    }

    fn token(&self) -> std::result::Result<String, NetworkError> {
        self.auth.access_token().ok_or(NetworkError::Unauthorized)
    }

    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, NetworkError> {
        let method = request.method;
        let url = request.url.clone();
        let response = self
            .transport
            .execute(request.timeout(self.timeout))
            .await
            .map_err(NetworkError::from)?;

        if response.status == 401 {
            warn!("[Connect] {} {} rejected the session token", method.as_str(), url);
            self.auth.invalidate();
        }
        response.error_for_status()
    }
}

#[async_trait]
impl RemoteApi for ApiClient {
    async fn upsert(
        &self,
        entity: SyncEntity,
        id: i64,
        payload: serde_json::Value,
    ) -> std::result::Result<(), NetworkError> {
        let token = self.token()?;
        let request = HttpRequest::put(self.record_url(entity, id))
            .json(&payload)
            .map_err(|e| NetworkError::BadRequest(e.to_string()))?
            .bearer(&token);

        self.send(request).await?;
        debug!("[Connect] Upserted {:?} {}", entity, id);
        Ok(())
    }

    async fn delete(&self, entity: SyncEntity, id: i64) -> std::result::Result<(), NetworkError> {
        let token = self.token()?;
        let request = HttpRequest::delete(self.record_url(entity, id)).bearer(&token);

        self.send(request).await?;
        debug!("[Connect] Deleted {:?} {}", entity, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::{start_mock_server, MockOutcome};
    use crate::transport::ReqwestTransport;
    use homebase_core::net::{HttpMethod, TransportError, TransportErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedAuth {
        token: Mutex<Option<String>>,
        invalidations: AtomicUsize,
    }

    impl FixedAuth {
        fn with_token(token: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                token: Mutex::new(token.map(str::to_string)),
                invalidations: AtomicUsize::new(0),
            })
        }
    }

    impl AuthContext for FixedAuth {
        fn access_token(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }

        fn invalidate(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            *self.token.lock().unwrap() = None;
        }
    }

    struct RecordingTransport {
        reply: std::result::Result<HttpResponse, TransportError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        fn new(reply: std::result::Result<HttpResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn upsert_puts_payload_with_bearer_token() {
        let transport = RecordingTransport::new(Ok(HttpResponse::new(200, "{}")));
        let client = ApiClient::new(
            "https://api.example.com/",
            transport.clone(),
            FixedAuth::with_token(Some("tok")),
        )
        .unwrap();

        client
            .upsert(SyncEntity::WorkOrder, 42, serde_json::json!({ "id": 42 }))
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(requests[0].url, "https://api.example.com/api/work-orders/42");
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"id":42}"#));
        assert_eq!(
            requests[0].headers.get("Authorization").map(String::as_str),
            Some("Bearer tok")
        );
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn missing_token_fails_without_a_request() {
        let transport = RecordingTransport::new(Ok(HttpResponse::new(200, "{}")));
        let client =
            ApiClient::new("https://api.example.com", transport.clone(), FixedAuth::with_token(None))
                .unwrap();

        let err = client.delete(SyncEntity::Door, 1).await.unwrap_err();

        assert_eq!(err, NetworkError::Unauthorized);
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_response_invalidates_session() {
        let transport = RecordingTransport::new(Ok(HttpResponse::new(401, "expired")));
        let auth = FixedAuth::with_token(Some("stale"));
        let client = ApiClient::new("https://api.example.com", transport, auth.clone()).unwrap();

        let err = client
            .upsert(SyncEntity::Payment, 3, serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(err, NetworkError::Unauthorized);
        assert_eq!(auth.invalidations.load(Ordering::SeqCst), 1);
        assert_eq!(auth.access_token(), None);
    }

    #[tokio::test]
    async fn other_failures_keep_the_session() {
        let transport = RecordingTransport::new(Ok(HttpResponse::new(404, "")));
        let auth = FixedAuth::with_token(Some("tok"));
        let client = ApiClient::new("https://api.example.com", transport, auth.clone()).unwrap();

        let err = client.delete(SyncEntity::UnlockEvent, 9).await.unwrap_err();

        assert_eq!(err, NetworkError::NotFound);
        assert_eq!(auth.invalidations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failures_are_classified() {
        let transport = RecordingTransport::new(Err(TransportError::new(
            TransportErrorKind::ConnectionLost,
            "reset by peer",
        )));
        let client = ApiClient::new(
            "https://api.example.com",
            transport,
            FixedAuth::with_token(Some("tok")),
        )
        .unwrap();

        let err = client
            .upsert(SyncEntity::User, 1, serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn delete_round_trips_through_http() {
        let (base_url, captured, server) =
            start_mock_server(vec![MockOutcome::ok(204, "")]).await;
        let transport = Arc::new(ReqwestTransport::new().expect("client"));
        let client =
            ApiClient::new(&base_url, transport, FixedAuth::with_token(Some("tok"))).unwrap();

        client.delete(SyncEntity::Notification, 12).await.unwrap();

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .request_line
            .starts_with("DELETE /api/notifications/12"));
        server.abort();
    }

    #[test]
    fn rejects_relative_base_url() {
        let transport = RecordingTransport::new(Ok(HttpResponse::new(200, "")));
        assert!(ApiClient::new("/api", transport, FixedAuth::with_token(None)).is_err());
    }
}
