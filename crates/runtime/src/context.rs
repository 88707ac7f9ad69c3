use std::sync::{Arc, Mutex, PoisonError};

use homebase_connect::ApiClient;
use homebase_core::config::AppConfig;
use homebase_core::errors::{Error, Result};
use homebase_core::net::{AuthContext, HttpTransport, RemoteApi};
use homebase_core::secrets::SecretStore;
use homebase_core::session::SessionController;
use homebase_core::sync::{Connectivity, SyncOrchestrator};
use homebase_storage_sqlite::{
    DoorRepository, EntityRepository, NotificationRepository, PaymentRepository,
    PropertyRepository, Store, StoredRecord, UnlockEventRepository, UserRepository,
    WorkOrderRepository,
};
use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Monitor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Process-wide handles to the data layer.
///
/// Built once at launch; every repository shares the same store and API client.
pub struct ServiceContext {
    config: AppConfig,
    store: Store,
    session: Arc<SessionController>,
    orchestrator: Arc<SyncOrchestrator>,

    user_repository: Arc<UserRepository>,
    property_repository: Arc<PropertyRepository>,
    work_order_repository: Arc<WorkOrderRepository>,
    payment_repository: Arc<PaymentRepository>,
    notification_repository: Arc<NotificationRepository>,
    door_repository: Arc<DoorRepository>,
    unlock_event_repository: Arc<UnlockEventRepository>,

    monitor: Mutex<Option<Monitor>>,
}

impl ServiceContext {
    /// Open and migrate the store, then assemble every service.
    ///
    /// Store and migration failures are fatal.
    pub async fn bootstrap(
        config: AppConfig,
        transport: Arc<dyn HttpTransport>,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self> {
        let store = Store::open(config.database_path())?;
        let report = store.migrate_to_latest().await?;
        if !report.is_noop() {
            info!(
                "[Store] Migrated schema {} -> {}",
                report.from_version, report.to_version
            );
        }

        let session = Arc::new(SessionController::new(
            config.session.clone(),
            Arc::clone(&transport),
            secrets,
        ));
        let auth: Arc<dyn AuthContext> = session.clone();
        let client = ApiClient::new(&config.api_base_url, transport, auth)
            .map_err(|e| Error::Config(e.to_string()))?
            .with_timeout(config.sync.push_timeout);
        let remote: Arc<dyn RemoteApi> = Arc::new(client);

        let user_repository = repository(&store, &remote, &config);
        let property_repository = repository(&store, &remote, &config);
        let work_order_repository = repository(&store, &remote, &config);
        let payment_repository = repository(&store, &remote, &config);
        let notification_repository = repository(&store, &remote, &config);
        let door_repository = repository(&store, &remote, &config);
        let unlock_event_repository = repository(&store, &remote, &config);

        let orchestrator = SyncOrchestrator::new(config.sync.clone());
        orchestrator.register(user_repository.clone());
        orchestrator.register(property_repository.clone());
        orchestrator.register(work_order_repository.clone());
        orchestrator.register(payment_repository.clone());
        orchestrator.register(notification_repository.clone());
        orchestrator.register(door_repository.clone());
        orchestrator.register(unlock_event_repository.clone());
        info!(
            "[Sync] Registered {} repositories",
            orchestrator.registered_count()
        );

        Ok(Self {
            config,
            store,
            session,
            orchestrator,
            user_repository,
            property_repository,
            work_order_repository,
            payment_repository,
            notification_repository,
            door_repository,
            unlock_event_repository,
            monitor: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn session(&self) -> Arc<SessionController> {
        Arc::clone(&self.session)
    }

    pub fn orchestrator(&self) -> Arc<SyncOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn user_repository(&self) -> Arc<UserRepository> {
        Arc::clone(&self.user_repository)
    }

    pub fn property_repository(&self) -> Arc<PropertyRepository> {
        Arc::clone(&self.property_repository)
    }

    pub fn work_order_repository(&self) -> Arc<WorkOrderRepository> {
        Arc::clone(&self.work_order_repository)
    }

    pub fn payment_repository(&self) -> Arc<PaymentRepository> {
        Arc::clone(&self.payment_repository)
    }

    pub fn notification_repository(&self) -> Arc<NotificationRepository> {
        Arc::clone(&self.notification_repository)
    }

    pub fn door_repository(&self) -> Arc<DoorRepository> {
        Arc::clone(&self.door_repository)
    }

    pub fn unlock_event_repository(&self) -> Arc<UnlockEventRepository> {
        Arc::clone(&self.unlock_event_repository)
    }

    /// Feed connectivity updates into the orchestrator. Replaces any running monitor.
    pub fn start_connectivity_monitor(&self, updates: watch::Receiver<Connectivity>) {
        let cancel = CancellationToken::new();
        let handle = self
            .orchestrator
            .spawn_connectivity_monitor(updates, cancel.clone());

        let previous = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Monitor { cancel, handle });
        if let Some(previous) = previous {
            warn!("[Sync] Replacing running connectivity monitor");
            previous.cancel.cancel();
        }
    }

    pub fn is_monitor_running(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|monitor| !monitor.handle.is_finished())
    }

    /// Stop the connectivity monitor and the periodic timer. In-flight cycles finish.
    pub fn shutdown(&self) {
        let monitor = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(monitor) = monitor {
            monitor.cancel.cancel();
        }
        self.orchestrator.shutdown();
        info!("[Sync] Service context shut down");
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        if let Some(monitor) = self
            .monitor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            monitor.cancel.cancel();
        }
    }
}

fn repository<T: StoredRecord>(
    store: &Store,
    remote: &Arc<dyn RemoteApi>,
    config: &AppConfig,
) -> Arc<EntityRepository<T>> {
    Arc::new(
        EntityRepository::new(store.clone(), Arc::clone(remote))
            .with_push_timeout(config.sync.push_timeout),
    )
}
