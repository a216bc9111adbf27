// ── Console container ──
//
// Owns the API client, one slice per entity, the analytics panel and the
// session. There are no globals: every consumer (and every test) works
// against its own `Console`.

use std::sync::{Arc, Mutex, Weak};

use amlctl_api::{ApiClient, AuthEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analytics::AnalyticsHandle;
use crate::config::ConsoleConfig;
use crate::error::CoreError;
use crate::model::{Case, EntityId};
use crate::resource::{Alerts, Cases, Customers, Devices, Reports, ResourceHandle, Transactions};
use crate::routes::{GuardDecision, Route, guard};
use crate::session::{SessionHandle, SessionState};

/// Entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    api: Arc<ApiClient>,
    customers: ResourceHandle<Customers>,
    transactions: ResourceHandle<Transactions>,
    alerts: ResourceHandle<Alerts>,
    cases: ResourceHandle<Cases>,
    reports: ResourceHandle<Reports>,
    devices: ResourceHandle<Devices>,
    analytics: AnalyticsHandle,
    session: SessionHandle,
    cancel: CancellationToken,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleInner {
    fn reset_data(&self) {
        self.customers.reset();
        self.transactions.reset();
        self.alerts.reset();
        self.cases.reset();
        self.reports.reset();
        self.devices.reset();
        self.analytics.reset();
    }
}

impl Console {
    /// Build the HTTP client and empty state from configuration. Nothing
    /// is fetched until asked.
    pub fn new(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let api = ApiClient::new(
            &config.api_url,
            &config.regulatory_url,
            &config.transport(),
            config.credential_store(),
        )?;
        Ok(Self::with_api(api))
    }

    /// Wrap an already-built client.
    pub fn with_api(api: ApiClient) -> Self {
        let api = Arc::new(api);
        Self {
            inner: Arc::new(ConsoleInner {
                customers: ResourceHandle::new(Arc::clone(&api)),
                transactions: ResourceHandle::new(Arc::clone(&api)),
                alerts: ResourceHandle::new(Arc::clone(&api)),
                cases: ResourceHandle::new(Arc::clone(&api)),
                reports: ResourceHandle::new(Arc::clone(&api)),
                devices: ResourceHandle::new(Arc::clone(&api)),
                analytics: AnalyticsHandle::new(Arc::clone(&api)),
                session: SessionHandle::new(Arc::clone(&api)),
                api,
                cancel: CancellationToken::new(),
                watcher: Mutex::new(None),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.inner.api
    }

    pub fn customers(&self) -> &ResourceHandle<Customers> {
        &self.inner.customers
    }

    pub fn transactions(&self) -> &ResourceHandle<Transactions> {
        &self.inner.transactions
    }

    pub fn alerts(&self) -> &ResourceHandle<Alerts> {
        &self.inner.alerts
    }

    pub fn cases(&self) -> &ResourceHandle<Cases> {
        &self.inner.cases
    }

    pub fn reports(&self) -> &ResourceHandle<Reports> {
        &self.inner.reports
    }

    pub fn devices(&self) -> &ResourceHandle<Devices> {
        &self.inner.devices
    }

    pub fn analytics(&self) -> &AnalyticsHandle {
        &self.inner.analytics
    }

    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the initial authentication check and start watching for
    /// session expiry. Must be called inside a Tokio runtime.
    pub fn start(&self) -> Arc<SessionState> {
        let state = self.inner.session.restore();

        let mut watcher = self.inner.watcher.lock().expect("watcher lock poisoned");
        if watcher.is_none() {
            let events = self.inner.api.subscribe_auth_events();
            let weak = Arc::downgrade(&self.inner);
            let cancel = self.inner.cancel.clone();
            *watcher = Some(tokio::spawn(watch_auth_events(weak, events, cancel)));
        }
        state
    }

    /// Stop the background watcher.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self
            .inner
            .watcher
            .lock()
            .expect("watcher lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("console shut down");
    }

    /// Guard decision for `route` given the current session.
    pub fn guard(&self, route: Route) -> GuardDecision {
        guard(route, &self.inner.session.state())
    }

    // ── Cross-slice operations ───────────────────────────────────────

    /// Escalate an alert into a case and place the case at the top of the
    /// case collection.
    pub async fn escalate_alert(&self, id: &EntityId, reason: &str) -> Result<Case, CoreError> {
        let epoch = self.inner.cases.epoch();
        let case = self.inner.alerts.escalate(id, reason).await?;
        self.inner.cases.insert_created(epoch, case.clone());
        info!(alert = %id, case = %case.id, "alert escalated");
        Ok(case)
    }

    /// Sign out and drop every cached collection.
    pub async fn sign_out(&self) -> Result<(), CoreError> {
        let outcome = self.inner.session.sign_out().await;
        self.inner.reset_data();
        outcome
    }
}

async fn watch_auth_events(
    console: Weak<ConsoleInner>,
    mut events: tokio::sync::broadcast::Receiver<AuthEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        let Some(inner) = console.upgrade() else {
            break;
        };
        match event {
            Ok(AuthEvent::SessionExpired) => {
                inner.session.expire();
                inner.reset_data();
            }
            Ok(event) => debug!(?event, "auth event"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "auth event watcher lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("auth event watcher stopped");
}
