use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use homebase_core::config::AppConfig;
use homebase_core::errors::{Error, SyncError};
use homebase_core::models::{Property, User, WorkOrder};
use homebase_core::net::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
use homebase_core::repository::RepositoryTrait;
use homebase_core::secrets::InMemorySecretStore;
use homebase_core::session::{Credentials, SessionStatus};
use homebase_core::sync::{Connectivity, SyncReport, TransportKind};
use homebase_runtime::ServiceContext;
use homebase_storage_sqlite::CURRENT_SCHEMA_VERSION;
use tempfile::TempDir;
use tokio::sync::watch;

const LOGIN_BODY: &str = r#"{
    "success": true,
    "user": { "id": 1, "phone": "+15550100", "name": "Ada", "role": "tenant" },
    "token": "session-token"
}"#;

/// Answers login, and accepts any authenticated record request.
#[derive(Default)]
struct FakeBackend {
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeBackend {
    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.url.ends_with("/api/auth/login") {
            return Ok(HttpResponse::new(200, LOGIN_BODY));
        }
        match request.headers.get("Authorization").map(String::as_str) {
            Some("Bearer session-token") => Ok(HttpResponse::new(200, "{}")),
            _ => Ok(HttpResponse::new(401, "")),
        }
    }
}

async fn bootstrap(dir: &TempDir, backend: Arc<FakeBackend>) -> ServiceContext {
    let config = AppConfig::new(dir.path(), "https://api.homebase.test/");
    ServiceContext::bootstrap(config, backend, Arc::new(InMemorySecretStore::new()))
        .await
        .expect("bootstrap")
}

/// Trigger until our own cycle runs rather than colliding with a scheduled one.
async fn sync_now(context: &ServiceContext) -> Result<SyncReport, SyncError> {
    for _ in 0..200 {
        match context.orchestrator().trigger_sync().await {
            Err(SyncError::SyncInProgress) => tokio::time::sleep(Duration::from_millis(10)).await,
            other => return other,
        }
    }
    panic!("sync never became idle");
}

async fn wait_until_connected(context: &ServiceContext) {
    for _ in 0..200 {
        if context.orchestrator().is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("connectivity monitor never reported connected");
}

#[tokio::test]
async fn bootstrap_migrates_and_registers_every_repository() {
    let dir = TempDir::new().unwrap();
    let context = bootstrap(&dir, Arc::new(FakeBackend::default())).await;

    assert_eq!(context.orchestrator().registered_count(), 7);
    assert_eq!(context.config().api_base_url, "https://api.homebase.test");
    assert_eq!(context.session().status(), SessionStatus::Unauthenticated);
    let version = homebase_storage_sqlite::db::current_version(context.store().pool()).unwrap();
    assert_eq!(version, CURRENT_SCHEMA_VERSION);
    drop(context);

    // A second launch against the same file is a no-op migration.
    let reopened = bootstrap(&dir, Arc::new(FakeBackend::default())).await;
    assert!(reopened.user_repository().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_api_url_fails_bootstrap() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::new(dir.path(), "not a url");

    let result = ServiceContext::bootstrap(
        config,
        Arc::new(FakeBackend::default()),
        Arc::new(InMemorySecretStore::new()),
    )
    .await;

    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn local_changes_sync_once_signed_in() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let context = bootstrap(&dir, backend.clone()).await;

    let user = context
        .user_repository()
        .save(User::new("+15550100", "Ada", "tenant"))
        .await
        .unwrap();
    let property = context
        .property_repository()
        .save(Property::new(user.id.unwrap(), "Home", "1 Main St"))
        .await
        .unwrap();
    let order = context
        .work_order_repository()
        .save(WorkOrder::new(property.id.unwrap(), "Leaking tap"))
        .await
        .unwrap();

    let (_connectivity_tx, connectivity_rx) =
        watch::channel(Connectivity::connected(TransportKind::Unmetered));
    context.start_connectivity_monitor(connectivity_rx);
    wait_until_connected(&context).await;
    assert!(context.is_monitor_running());

    // Signed out: every push is rejected locally and the records stay pending.
    assert!(matches!(
        sync_now(&context).await,
        Err(SyncError::PartialSyncFailure(_))
    ));
    assert_eq!(context.work_order_repository().pending_count().unwrap(), 1);

    context
        .session()
        .login(Credentials::new("+15550100", "secret"))
        .await
        .unwrap();
    assert_eq!(context.session().status(), SessionStatus::Authenticated);

    sync_now(&context).await.unwrap();
    assert_eq!(context.user_repository().pending_count().unwrap(), 0);
    assert_eq!(context.property_repository().pending_count().unwrap(), 0);
    assert_eq!(context.work_order_repository().pending_count().unwrap(), 0);

    let order_id = order.id.unwrap();
    let order_url = format!("https://api.homebase.test/api/work-orders/{}", order_id);
    assert!(backend
        .requests()
        .iter()
        .any(|r| r.method == HttpMethod::Put && r.url == order_url));

    assert!(context.work_order_repository().delete(order_id).await.unwrap());
    let report = sync_now(&context).await.unwrap();
    assert_eq!(report.purged_count(), 1);
    assert!(context.work_order_repository().list_all().unwrap().is_empty());

    context.shutdown();
    assert!(!context.orchestrator().is_timer_running());
}
