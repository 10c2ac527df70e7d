//! Session lifecycle management.
//!
//! The session manager exclusively owns the [`Identity`]: restoring it
//! from storage at process start, constructing it on auth success,
//! clearing it on logout. It also owns the reconciliation interval - the
//! polling loop lives exactly as long as the session does.
//!
//! Restoration is optimistic: no network call is made, so the restored
//! identity may be stale until the first reconciliation cycle corrects it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use upgrow_core::{Email, Role};

use crate::api::ApiClient;
use crate::api::types::{
    AuthResponse, GoogleAuthRequest, LoginRequest, OnboardingRequest, SignupRequest, UserPayload,
};
use crate::error::EngineError;
use crate::models::Identity;
use crate::models::identity::split_full_name;
use crate::router::ViewToggles;
use crate::store::SessionStore;
use crate::sync::DashboardEngine;
use crate::tasks::PollTask;

/// How the identity authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
    Google,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Signup => write!(f, "signup"),
            Self::Google => write!(f, "google"),
        }
    }
}

/// Shared, read-mostly view of the active session.
///
/// Cloned into every component that needs to know who is logged in (the
/// dashboard engine, the maintenance gate, the router composition).
#[derive(Clone, Default)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

#[derive(Default)]
struct SessionShared {
    identity: RwLock<Option<Identity>>,
    active: AtomicBool,
}

impl SessionHandle {
    /// Whether a session is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Relaxed)
    }

    /// The active identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.shared.identity.read().clone()
    }

    /// The active identity's role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.shared.identity.read().as_ref().map(|i| i.role)
    }

    /// The active identity's email, if any.
    #[must_use]
    pub fn email(&self) -> Option<Email> {
        self.shared.identity.read().as_ref().map(|i| i.email.clone())
    }

    pub(crate) fn set_identity(&self, identity: Identity) {
        *self.shared.identity.write() = Some(identity);
        self.shared.active.store(true, Ordering::Relaxed);
    }

    /// Mutate the active identity in place, returning the updated copy.
    pub(crate) fn update_identity(
        &self,
        mutate: impl FnOnce(&mut Identity),
    ) -> Option<Identity> {
        let mut guard = self.shared.identity.write();
        let identity = guard.as_mut()?;
        mutate(identity);
        Some(identity.clone())
    }

    pub(crate) fn clear(&self) {
        self.shared.active.store(false, Ordering::Relaxed);
        *self.shared.identity.write() = None;
    }
}

/// Session lifecycle manager.
pub struct SessionManager {
    api: ApiClient,
    store: SessionStore,
    session: SessionHandle,
    sync: DashboardEngine,
    toggles: Arc<ViewToggles>,
    reconcile_interval: Duration,
    reconcile_task: Mutex<Option<PollTask>>,
}

impl SessionManager {
    pub(crate) fn new(
        api: ApiClient,
        store: SessionStore,
        session: SessionHandle,
        sync: DashboardEngine,
        toggles: Arc<ViewToggles>,
        reconcile_interval: Duration,
    ) -> Self {
        Self {
            api,
            store,
            session,
            sync,
            toggles,
            reconcile_interval,
            reconcile_task: Mutex::new(None),
        }
    }

    /// Restore a previously persisted session.
    ///
    /// No network call is made; the recovered identity may be stale until
    /// the first reconciliation. A malformed identity record is treated as
    /// "no session", never as an error. Returns whether a session was
    /// restored.
    ///
    /// Must be called from within a tokio runtime (it starts the
    /// reconciliation interval).
    pub fn restore(&self) -> bool {
        if !self.store.session_active() {
            return false;
        }
        let Some(identity) = self.store.load_identity() else {
            // A marker without a readable identity record is no session.
            warn!("active-session marker without identity record, starting logged out");
            self.store.set_session_active(false);
            return false;
        };

        if let Some(token) = self.store.load_token() {
            self.api.set_token(SecretString::from(token));
        }

        info!(email = %identity.email, role = %identity.role, "session restored from storage");
        self.sync.prime(&identity);
        self.session.set_identity(identity);
        self.start_reconciliation();
        true
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Backend rejections carry the backend's `detail` message verbatim.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, EngineError> {
        let email = Email::parse(email)?;
        let response: AuthResponse = self
            .api
            .post(
                "/auth/login",
                &LoginRequest {
                    email: email.as_str().to_owned(),
                    password: password.to_owned(),
                },
            )
            .await?;
        Ok(self.complete_auth(AuthMode::Login, email, response))
    }

    /// Create an account.
    ///
    /// The signup endpoint confirms with a bare 2xx; the local identity is
    /// constructed from the submitted name and goes through onboarding
    /// before the first full login.
    ///
    /// # Errors
    ///
    /// Backend rejections carry the backend's `detail` message verbatim.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, EngineError> {
        let email = Email::parse(email)?;
        self.api
            .post_unit(
                "/auth/signup",
                &SignupRequest {
                    name: name.trim().to_owned(),
                    email: email.as_str().to_owned(),
                    password: password.to_owned(),
                },
            )
            .await?;

        let response = AuthResponse {
            access_token: None,
            user: Some(UserPayload {
                full_name: Some(name.trim().to_owned()),
                ..UserPayload::default()
            }),
        };
        Ok(self.complete_auth(AuthMode::Signup, email, response))
    }

    /// Authenticate with a Google ID token.
    ///
    /// # Errors
    ///
    /// Fails if the backend response carries no email for the account.
    #[instrument(skip(self, token))]
    pub async fn login_google(&self, token: &str) -> Result<Identity, EngineError> {
        let response: AuthResponse = self
            .api
            .post(
                "/auth/google",
                &GoogleAuthRequest {
                    token: token.to_owned(),
                },
            )
            .await?;

        let email = response
            .user
            .as_ref()
            .and_then(|user| user.email.as_deref())
            .ok_or_else(|| {
                EngineError::Auth("Google sign-in did not return an account email".to_owned())
            })?;
        let email = Email::parse(email)?;
        Ok(self.complete_auth(AuthMode::Google, email, response))
    }

    /// Establish a session from a backend auth response.
    ///
    /// Normalizes the payload into an [`Identity`] (role derivation
    /// included), persists it, installs the bearer credential if one was
    /// returned, and starts the reconciliation interval with an immediate
    /// first cycle. A non-administrator identity with incomplete
    /// onboarding will route to the Onboarding view on the next
    /// resolution.
    pub fn complete_auth(&self, mode: AuthMode, email: Email, response: AuthResponse) -> Identity {
        let payload = response.user.unwrap_or_default();
        let mut identity = Identity::from_payload(email, &payload);

        // A previously persisted completion marker survives re-login even
        // when the backend has not caught up yet.
        if self.store.onboarding_complete(&identity.email) {
            identity.onboarding_complete = true;
        }

        if let Some(token) = response.access_token {
            self.store.save_token(&token);
            self.api.set_token(SecretString::from(token));
        }

        self.store.save_identity(&identity);
        self.store.set_session_active(true);
        self.sync.prime(&identity);
        self.session.set_identity(identity.clone());
        self.start_reconciliation();

        info!(mode = %mode, role = %identity.role, "session established");
        identity
    }

    /// Submit the onboarding form and mark the account onboarded.
    ///
    /// Sessions without a bearer credential complete onboarding locally
    /// only, mirroring the offline order flow.
    ///
    /// # Errors
    ///
    /// Requires an active session; backend rejections surface verbatim.
    #[instrument(skip(self, form))]
    pub async fn complete_onboarding(&self, form: OnboardingRequest) -> Result<(), EngineError> {
        if self.session.identity().is_none() {
            return Err(EngineError::NotAuthenticated);
        }

        if self.api.has_token() {
            self.api.post_unit("/onboarding", &form).await?;
        }

        let updated = self.session.update_identity(|identity| {
            identity.onboarding_complete = true;
            if !form.full_name.trim().is_empty() {
                let (first_name, last_name) = split_full_name(&form.full_name);
                identity.first_name = first_name;
                identity.last_name = last_name;
            }
            identity.phone = form.phone.clone();
            identity.country = form.country.clone();
            identity.agency_name = form.agency_name.clone();
        });

        if let Some(identity) = updated {
            self.store.mark_onboarding_complete(&identity.email);
            self.store.save_identity(&identity);
        }
        Ok(())
    }

    /// End the session.
    ///
    /// Clears the active-session marker, the bearer credential, the
    /// in-memory identity, the view toggles, and cancels the
    /// reconciliation interval. The per-account snapshot and the identity
    /// record deliberately stay in storage so the next login for the same
    /// account renders instantly from cache.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.stop_reconciliation();
        self.session.clear();
        self.api.clear_token();
        self.store.clear_token();
        self.store.set_session_active(false);
        self.toggles.reset();
        info!("session ended");
    }

    fn start_reconciliation(&self) {
        let sync = self.sync.clone();
        let task = PollTask::spawn("dashboard-reconcile", self.reconcile_interval, move || {
            let sync = sync.clone();
            async move {
                sync.reconcile().await;
            }
        });
        // Replacing an existing task aborts the previous loop.
        *self.reconcile_task.lock() = Some(task);
    }

    pub(crate) fn stop_reconciliation(&self) {
        *self.reconcile_task.lock() = None;
    }

    /// Whether the reconciliation interval is currently running.
    #[must_use]
    pub fn reconciliation_running(&self) -> bool {
        self.reconcile_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::config::PanelConfig;
    use crate::store::MemoryStore;

    use upgrow_core::SUPER_ADMIN_EMAIL;

    fn manager() -> SessionManager {
        // Unroutable port: background reconciliation fails fast and keeps
        // cached state, which is exactly the degradation under test.
        let config = PanelConfig::new("http://127.0.0.1:9");
        let api = ApiClient::new(&config).unwrap();
        let store = SessionStore::new(Arc::new(MemoryStore::default()));
        let session = SessionHandle::default();
        let sync = DashboardEngine::new(api.clone(), store.clone(), session.clone());
        SessionManager::new(
            api,
            store,
            session,
            sync,
            Arc::new(ViewToggles::default()),
            Duration::from_secs(60),
        )
    }

    fn auth_response(token: Option<&str>, payload: UserPayload) -> AuthResponse {
        AuthResponse {
            access_token: token.map(str::to_owned),
            user: Some(payload),
        }
    }

    #[tokio::test]
    async fn test_restore_without_marker() {
        let manager = manager();
        assert!(!manager.restore());
        assert!(!manager.session.is_active());
    }

    #[tokio::test]
    async fn test_complete_auth_persists_and_activates() {
        let manager = manager();
        let email = Email::parse("sara@agency.ma").unwrap();

        let identity = manager.complete_auth(
            AuthMode::Login,
            email.clone(),
            auth_response(Some("tok_1"), UserPayload::default()),
        );

        assert_eq!(identity.email, email);
        assert!(manager.session.is_active());
        assert!(manager.api.has_token());
        assert_eq!(manager.store.load_token().as_deref(), Some("tok_1"));
        assert!(manager.store.session_active());
        assert!(manager.reconciliation_running());
        assert_eq!(manager.store.load_identity().unwrap(), identity);
    }

    #[tokio::test]
    async fn test_complete_auth_super_admin_override() {
        let manager = manager();
        let email = Email::parse(SUPER_ADMIN_EMAIL).unwrap();

        // Backend insists the account is a plain user.
        let payload = UserPayload {
            role: Some("user".to_owned()),
            ..UserPayload::default()
        };
        let identity =
            manager.complete_auth(AuthMode::Login, email, auth_response(None, payload));

        assert_eq!(identity.role, Role::Administrator);
    }

    #[tokio::test]
    async fn test_restore_roundtrip() {
        let manager = manager();
        let email = Email::parse("sara@agency.ma").unwrap();
        manager.complete_auth(
            AuthMode::Login,
            email.clone(),
            auth_response(Some("tok_1"), UserPayload::default()),
        );

        // Simulate a process restart against the same storage.
        let session = SessionHandle::default();
        let sync = DashboardEngine::new(
            manager.api.clone(),
            manager.store.clone(),
            session.clone(),
        );
        let restarted = SessionManager::new(
            manager.api.clone(),
            manager.store.clone(),
            session.clone(),
            sync,
            Arc::new(ViewToggles::default()),
            Duration::from_secs(60),
        );

        assert!(restarted.restore());
        assert_eq!(session.email(), Some(email));
        assert!(restarted.reconciliation_running());
    }

    #[tokio::test]
    async fn test_restore_with_malformed_identity_is_no_session() {
        let manager = manager();
        manager.store.set_session_active(true);
        // No identity record was ever written.

        assert!(!manager.restore());
        assert!(!manager.store.session_active());
    }

    #[tokio::test]
    async fn test_logout_clears_session_but_keeps_snapshot() {
        let manager = manager();
        let email = Email::parse("sara@agency.ma").unwrap();
        manager.complete_auth(
            AuthMode::Login,
            email.clone(),
            auth_response(Some("tok_1"), UserPayload::default()),
        );
        manager.toggles.set_manager_preview(true);

        // Persist something worth keeping.
        let snapshot = crate::models::DashboardSnapshot::default();
        manager.store.save_snapshot(&email, &snapshot);

        manager.logout();

        assert!(!manager.session.is_active());
        assert!(manager.session.identity().is_none());
        assert!(!manager.api.has_token());
        assert!(manager.store.load_token().is_none());
        assert!(!manager.store.session_active());
        assert!(!manager.reconciliation_running());
        assert!(!manager.toggles.manager_preview());
        // Deliberate: the per-account cache survives for fast re-login.
        assert!(manager.store.load_snapshot(&email).is_some());
        assert!(manager.store.load_identity().is_some());
    }

    #[tokio::test]
    async fn test_onboarding_marker_survives_relogin() {
        let manager = manager();
        let email = Email::parse("sara@agency.ma").unwrap();
        manager.store.mark_onboarding_complete(&email);

        let identity = manager.complete_auth(
            AuthMode::Login,
            email,
            auth_response(None, UserPayload::default()),
        );
        assert!(identity.onboarding_complete);
    }

    #[tokio::test]
    async fn test_complete_onboarding_locally_without_token() {
        let manager = manager();
        let email = Email::parse("sara@agency.ma").unwrap();
        manager.complete_auth(
            AuthMode::Signup,
            email.clone(),
            auth_response(None, UserPayload::default()),
        );

        manager
            .complete_onboarding(OnboardingRequest {
                full_name: "Sara El Amrani".to_owned(),
                phone: "+212600000000".to_owned(),
                country: "Morocco".to_owned(),
                agency_name: "Amrani Media".to_owned(),
            })
            .await
            .unwrap();

        let identity = manager.session.identity().unwrap();
        assert!(identity.onboarding_complete);
        assert_eq!(identity.first_name, "Sara");
        assert_eq!(identity.agency_name, "Amrani Media");
        assert!(manager.store.onboarding_complete(&email));
    }

    #[tokio::test]
    async fn test_complete_onboarding_requires_session() {
        let manager = manager();
        let result = manager
            .complete_onboarding(OnboardingRequest {
                full_name: String::new(),
                phone: String::new(),
                country: String::new(),
                agency_name: String::new(),
            })
            .await;
        assert!(matches!(result, Err(EngineError::NotAuthenticated)));
    }
}
