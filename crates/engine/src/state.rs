//! Engine state shared with the embedding view layer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::ApiClient;
use crate::config::PanelConfig;
use crate::error::EngineError;
use crate::maintenance::MaintenanceGate;
use crate::orders::OrderIntentHandler;
use crate::router::{self, AppView, RouteInputs, ViewToggles};
use crate::session::{SessionHandle, SessionManager};
use crate::store::{KvStore, SessionStore};
use crate::sync::DashboardEngine;
use crate::tasks::PollTask;

/// Top-level engine handle wiring every component together.
///
/// This struct is cheaply cloneable via `Arc` and is what the embedding
/// view layer holds: it reads the snapshot and the current view from here
/// and feeds action intents (log in, create order, complete onboarding)
/// back in.
#[derive(Clone)]
pub struct PanelEngine {
    inner: Arc<PanelEngineInner>,
}

struct PanelEngineInner {
    config: PanelConfig,
    api: ApiClient,
    store: SessionStore,
    session: SessionHandle,
    toggles: Arc<ViewToggles>,
    sync: DashboardEngine,
    gate: MaintenanceGate,
    orders: OrderIntentHandler,
    sessions: SessionManager,
    maintenance_task: Mutex<Option<PollTask>>,
}

impl PanelEngine {
    /// Create an engine over the given persistence medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: PanelConfig, medium: Arc<dyn KvStore>) -> Result<Self, EngineError> {
        let api = ApiClient::new(&config)?;
        let store = SessionStore::new(medium);
        let session = SessionHandle::default();
        let toggles = Arc::new(ViewToggles::default());
        let gate = MaintenanceGate::default();
        let sync = DashboardEngine::new(api.clone(), store.clone(), session.clone());
        let sessions = SessionManager::new(
            api.clone(),
            store.clone(),
            session.clone(),
            sync.clone(),
            Arc::clone(&toggles),
            config.reconcile_interval,
        );
        let orders = OrderIntentHandler::new(api.clone(), sync.clone());

        Ok(Self {
            inner: Arc::new(PanelEngineInner {
                config,
                api,
                store,
                session,
                toggles,
                sync,
                gate,
                orders,
                sessions,
                maintenance_task: Mutex::new(None),
            }),
        })
    }

    /// Start the maintenance probe loop.
    ///
    /// Runs from engine start, login or not, until [`PanelEngine::shutdown`]
    /// or drop. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let api = self.inner.api.clone();
        let session = self.inner.session.clone();
        let gate = self.inner.gate.clone();

        let task = PollTask::spawn(
            "maintenance-probe",
            self.inner.config.maintenance_interval,
            move || {
                let api = api.clone();
                let session = session.clone();
                let gate = gate.clone();
                async move {
                    gate.poll(&api, &session).await;
                }
            },
        );
        *self.inner.maintenance_task.lock() = Some(task);
    }

    /// Tear down every periodic task without ending the persisted session.
    pub fn shutdown(&self) {
        *self.inner.maintenance_task.lock() = None;
        self.inner.sessions.stop_reconciliation();
    }

    /// Resolve the view to present right now.
    ///
    /// Composes the pure router with the maintenance overlay.
    #[must_use]
    pub fn current_view(&self) -> AppView {
        let identity = self.inner.session.identity();
        let inputs = RouteInputs {
            logged_in: self.inner.session.is_active(),
            onboarding_complete: identity
                .as_ref()
                .is_some_and(|identity| identity.onboarding_complete),
            account_active: identity
                .as_ref()
                .is_none_or(|identity| identity.account_active),
            role: identity.as_ref().map(|identity| identity.role),
            admin_view: self.inner.toggles.admin_view(),
            manager_preview: self.inner.toggles.manager_preview(),
        };

        let view = router::resolve(&inputs);
        router::gated(view, self.inner.gate.is_unavailable(), inputs.role)
    }

    /// Session lifecycle operations (restore, login, signup, logout).
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// The shared session handle.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    /// Dashboard snapshot access and reconciliation.
    #[must_use]
    pub fn dashboard(&self) -> &DashboardEngine {
        &self.inner.sync
    }

    /// Order submission.
    #[must_use]
    pub fn orders(&self) -> &OrderIntentHandler {
        &self.inner.orders
    }

    /// Admin/manager view toggles.
    #[must_use]
    pub fn toggles(&self) -> &ViewToggles {
        &self.inner.toggles
    }

    /// The maintenance gate.
    #[must_use]
    pub fn maintenance(&self) -> &MaintenanceGate {
        &self.inner.gate
    }

    /// The typed session store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.inner.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::api::types::{AuthResponse, UserPayload};
    use crate::session::AuthMode;
    use crate::store::MemoryStore;

    use upgrow_core::Email;

    fn engine() -> PanelEngine {
        let config = PanelConfig::new("http://127.0.0.1:9");
        PanelEngine::new(config, Arc::new(MemoryStore::default())).unwrap()
    }

    fn auth(engine: &PanelEngine, email: &str, payload: UserPayload) {
        engine.sessions().complete_auth(
            AuthMode::Login,
            Email::parse(email).unwrap(),
            AuthResponse {
                access_token: None,
                user: Some(payload),
            },
        );
    }

    #[tokio::test]
    async fn test_logged_out_view_is_public_site() {
        assert_eq!(engine().current_view(), AppView::PublicSite);
    }

    #[tokio::test]
    async fn test_customer_routes_through_onboarding() {
        let engine = engine();
        auth(&engine, "sara@agency.ma", UserPayload::default());
        assert_eq!(engine.current_view(), AppView::Onboarding);

        engine
            .session()
            .update_identity(|identity| identity.onboarding_complete = true);
        assert_eq!(engine.current_view(), AppView::CustomerPanel);
    }

    #[tokio::test]
    async fn test_deactivated_account_view() {
        let engine = engine();
        auth(
            &engine,
            "sara@agency.ma",
            UserPayload {
                is_active: Some(false),
                onboarding_complete: Some(true),
                ..UserPayload::default()
            },
        );
        assert_eq!(engine.current_view(), AppView::Deactivated);
    }

    #[tokio::test]
    async fn test_admin_view_and_manager_preview() {
        let engine = engine();
        auth(
            &engine,
            "sara@agency.ma",
            UserPayload {
                role: Some("admin".to_owned()),
                ..UserPayload::default()
            },
        );
        assert_eq!(engine.current_view(), AppView::AdminPanel);

        engine.toggles().set_manager_preview(true);
        assert_eq!(engine.current_view(), AppView::ManagerPanel);

        engine.sessions().logout();
        assert_eq!(engine.current_view(), AppView::PublicSite);
        assert!(!engine.toggles().manager_preview());
    }

    #[tokio::test]
    async fn test_shutdown_stops_tasks() {
        let engine = engine();
        engine.start();
        auth(&engine, "sara@agency.ma", UserPayload::default());
        assert!(engine.sessions().reconciliation_running());

        engine.shutdown();
        assert!(!engine.sessions().reconciliation_running());
    }
}
