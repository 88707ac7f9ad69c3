//! Reconciles local state with the remote whenever connectivity allows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::errors::{Error, SyncError};
use crate::models::SyncEntity;
use crate::repository::{RepositoryId, SyncOutcome, SyncRepositoryTrait};

use super::{Connectivity, ConnectivityState, SyncCycleStatus, SyncEngineStatus, SyncReport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct PeriodicTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Connectivity state machine, repository registry and periodic sync driver.
///
/// At most one sync cycle runs at a time for the whole app. Construct once at
/// process start and share through `Arc`.
pub struct SyncOrchestrator {
    config: SyncConfig,
    registry: Mutex<Vec<Arc<dyn SyncRepositoryTrait>>>,
    connectivity: Mutex<Connectivity>,
    in_flight: Arc<AtomicBool>,
    timer: Mutex<Option<PeriodicTimer>>,
    status: Arc<Mutex<SyncEngineStatus>>,
}

impl SyncOrchestrator {
    pub fn new(config: SyncConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry: Mutex::new(Vec::new()),
            connectivity: Mutex::new(Connectivity::disconnected()),
            in_flight: Arc::new(AtomicBool::new(false)),
            timer: Mutex::new(None),
            status: Arc::new(Mutex::new(SyncEngineStatus::default())),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a repository unless one with the same id is already registered.
    pub fn register(&self, repository: Arc<dyn SyncRepositoryTrait>) -> bool {
        let id = repository.repository_id();
        let mut registry = lock(&self.registry);
        if registry.iter().any(|r| r.repository_id() == id) {
            debug!("[Sync] Repository {} already registered", id);
            return false;
        }
        debug!(
            "[Sync] Registered {:?} repository {}",
            repository.entity(),
            id
        );
        registry.push(repository);
        true
    }

    pub fn unregister(&self, id: RepositoryId) -> bool {
        let mut registry = lock(&self.registry);
        let before = registry.len();
        registry.retain(|r| r.repository_id() != id);
        registry.len() != before
    }

    pub fn registered_count(&self) -> usize {
        lock(&self.registry).len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Connectivity
    // ─────────────────────────────────────────────────────────────────────────

    pub fn connectivity(&self) -> Connectivity {
        *lock(&self.connectivity)
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity().is_connected()
    }

    /// Apply a connectivity update.
    ///
    /// `disconnected → connected` runs one cycle immediately and starts the
    /// periodic timer; `connected → disconnected` stops the timer but leaves an
    /// in-flight cycle alone. Must be called from within a tokio runtime.
    pub fn set_connectivity(self: &Arc<Self>, next: Connectivity) {
        let previous = std::mem::replace(&mut *lock(&self.connectivity), next);

        match (previous.state, next.state) {
            (ConnectivityState::Disconnected, ConnectivityState::Connected) => {
                info!(
                    "[Sync] Connected ({:?}). Starting periodic sync every {}s",
                    next.transport,
                    self.config.interval.as_secs()
                );
                self.start_timer();
            }
            (ConnectivityState::Connected, ConnectivityState::Disconnected) => {
                info!("[Sync] Disconnected. Stopping periodic sync");
                self.stop_timer();
            }
            _ if previous.transport != next.transport => {
                debug!(
                    "[Sync] Transport changed {:?} -> {:?}",
                    previous.transport, next.transport
                );
            }
            _ => {}
        }
    }

    /// Long-lived task feeding connectivity updates into the state machine.
    pub fn spawn_connectivity_monitor(
        self: &Arc<Self>,
        mut updates: watch::Receiver<Connectivity>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let initial = *updates.borrow_and_update();
            orchestrator.set_connectivity(initial);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            debug!("[Sync] Connectivity source closed");
                            break;
                        }
                        let next = *updates.borrow_and_update();
                        orchestrator.set_connectivity(next);
                    }
                }
            }
        })
    }

    fn start_timer(self: &Arc<Self>) {
        let mut timer = lock(&self.timer);
        if timer
            .as_ref()
            .is_some_and(|t| !t.cancel.is_cancelled() && !t.handle.is_finished())
        {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.config.interval;
        let orchestrator: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    // The first tick completes immediately: that is the on-connect cycle.
                    _ = ticker.tick() => {
                        let Some(orchestrator) = orchestrator.upgrade() else {
                            break;
                        };
                        tokio::spawn(async move {
                            orchestrator.run_scheduled_cycle().await;
                        });
                    }
                }
            }
            debug!("[Sync] Periodic timer stopped");
        });

        *timer = Some(PeriodicTimer { cancel, handle });
    }

    fn stop_timer(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.cancel.cancel();
        }
    }

    pub fn is_timer_running(&self) -> bool {
        lock(&self.timer)
            .as_ref()
            .is_some_and(|t| !t.cancel.is_cancelled() && !t.handle.is_finished())
    }

    /// Stop automatic triggers. In-flight cycles finish on their own.
    pub fn shutdown(&self) {
        self.stop_timer();
    }

    async fn run_scheduled_cycle(&self) {
        match self.trigger_sync().await {
            Ok(report) => debug!(
                "[Sync] Scheduled cycle complete pushed={} purged={} duration={}ms",
                report.pushed_count(),
                report.purged_count(),
                report.duration_ms
            ),
            Err(err) if err.is_noop() => debug!("[Sync] Scheduled cycle skipped: {}", err),
            Err(err) => warn!("[Sync] Scheduled cycle failed: {}", err),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Run one sync cycle across every registered repository.
    ///
    /// Returns `NetworkUnavailable` while disconnected and `SyncInProgress` if a
    /// cycle is already running, in both cases without touching a repository.
    /// Otherwise waits for every repository and aggregates all errors.
    pub async fn trigger_sync(&self) -> Result<SyncReport, SyncError> {
        if !self.is_connected() {
            return Err(SyncError::NetworkUnavailable);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SyncError::SyncInProgress);
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let repositories = lock(&self.registry).clone();
        let status = Arc::clone(&self.status);

        // The cycle runs in its own task so a dropped caller cannot cut it short.
        let cycle = tokio::spawn(async move {
            let _guard = guard;
            let started_at = Instant::now();
            debug!(
                "[Sync] Cycle started across {} repositories",
                repositories.len()
            );

            let (outcomes, errors) = fan_out(repositories).await;
            let duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
            record_cycle(&status, &outcomes, &errors, duration_ms);

            if errors.is_empty() {
                Ok(SyncReport {
                    outcomes,
                    duration_ms,
                })
            } else {
                Err(SyncError::PartialSyncFailure(errors))
            }
        });

        match cycle.await {
            Ok(result) => result,
            Err(err) => Err(SyncError::PartialSyncFailure(vec![Error::Sync(
                SyncError::TaskFailed(format!("sync cycle task failed: {}", err)),
            )])),
        }
    }

    pub fn is_sync_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> SyncEngineStatus {
        let mut status = lock(&self.status).clone();
        status.timer_running = self.is_timer_running();
        status
    }
}

impl Drop for SyncOrchestrator {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

/// Push every repository concurrently and wait for all of them.
async fn fan_out(
    repositories: Vec<Arc<dyn SyncRepositoryTrait>>,
) -> (Vec<SyncOutcome>, Vec<Error>) {
    let tasks = repositories
        .into_iter()
        .map(|repository| {
            let entity = repository.entity();
            let handle = tokio::spawn(async move { repository.sync_pending_changes().await });
            async move { (entity, handle.await) }
        })
        .collect::<Vec<_>>();

    let mut outcomes = Vec::with_capacity(tasks.len());
    let mut errors = Vec::new();

    for (entity, joined) in join_all(tasks).await {
        match joined {
            Ok(Ok(outcome)) => {
                if !outcome.failures.is_empty() {
                    warn!(
                        "[Sync] {:?}: {} record(s) failed, will retry next cycle",
                        entity,
                        outcome.failures.len()
                    );
                    errors.push(Error::Sync(SyncError::RecordsFailed {
                        entity,
                        failures: outcome.failures.clone(),
                    }));
                }
                outcomes.push(outcome);
            }
            Ok(Err(err)) => {
                warn!("[Sync] {:?} repository failed: {}", entity, err);
                errors.push(err);
            }
            Err(err) => {
                warn!("[Sync] {:?} repository task failed: {}", entity, err);
                errors.push(Error::Sync(SyncError::TaskFailed(format!(
                    "{:?} repository task failed: {}",
                    entity, err
                ))));
            }
        }
    }

    (outcomes, errors)
}

fn record_cycle(
    status: &Mutex<SyncEngineStatus>,
    outcomes: &[SyncOutcome],
    errors: &[Error],
    duration_ms: u64,
) {
    let mut status = lock(status);
    status.last_cycle_at = Some(Utc::now());
    status.last_cycle_duration_ms = Some(duration_ms);
    status.last_pushed_count = outcomes.iter().map(|o| o.pushed.len()).sum();
    if errors.is_empty() {
        status.last_cycle_status = Some(SyncCycleStatus::Ok);
        status.consecutive_failures = 0;
        status.last_error = None;
    } else {
        status.last_cycle_status = Some(SyncCycleStatus::PartialFailure);
        status.consecutive_failures = status.consecutive_failures.saturating_add(1);
        status.last_error = errors.first().map(ToString::to_string);
    }
}
