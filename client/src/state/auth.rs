//! Process-wide authentication state.
//!
//! ```text
//! checking ──bootstrap──▶ idle ⇄ loading ──login ok──▶ authenticated
//!     └──token valid──▶ authenticated
//! authenticated ──logout / forced invalidation──▶ idle
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::api::{ApiClient, ApiError, LoginRequest, User, SESSION_EXPIRED_MESSAGE};
use crate::utils::storage::{SecureStore, TOKEN_KEY};

const GENERIC_LOGIN_ERROR: &str = "No se pudo iniciar sesión. Verifica tus credenciales.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Checking,
    Idle,
    Loading,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub token: Option<String>,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map(User::is_admin).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn(User),
    LoggedOut,
    /// The server rejected a token that was backing an authenticated session.
    Expired { message: String },
}

pub struct SessionStore {
    state: watch::Sender<AuthState>,
    events: broadcast::Sender<SessionEvent>,
    storage: Arc<dyn SecureStore>,
    invalidating: AtomicBool,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SecureStore>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let (events, _) = broadcast::channel(16);
        Self {
            state,
            events,
            storage,
            invalidating: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn discard_persisted_token(&self) {
        if let Err(err) = self.storage.remove(TOKEN_KEY).await {
            tracing::warn!(error = %err, "failed to remove persisted token");
        }
    }

    /// Restores a persisted session at startup.
    pub async fn bootstrap(&self, api: &ApiClient) -> AuthStatus {
        let stored = match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "could not read persisted token");
                None
            }
        };

        let Some(token) = stored else {
            self.state.send_modify(|state| {
                *state = AuthState {
                    status: AuthStatus::Idle,
                    ..AuthState::default()
                }
            });
            return AuthStatus::Idle;
        };

        self.state.send_modify(|state| {
            state.status = AuthStatus::Checking;
            state.token = Some(token);
            state.error = None;
        });

        match api.me().await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "restored session");
                self.state.send_modify(|state| {
                    state.status = AuthStatus::Authenticated;
                    state.user = Some(user);
                });
                AuthStatus::Authenticated
            }
            Err(err) => {
                tracing::info!(error = %err, "stored token rejected; starting signed out");
                self.discard_persisted_token().await;
                self.state.send_modify(|state| {
                    *state = AuthState {
                        status: AuthStatus::Idle,
                        ..AuthState::default()
                    }
                });
                AuthStatus::Idle
            }
        }
    }

    pub async fn login(&self, api: &ApiClient, request: LoginRequest) -> Result<User, ApiError> {
        self.state.send_modify(|state| {
            state.status = AuthStatus::Loading;
            state.error = None;
        });

        let response = match api.login(&request).await {
            Ok(response) => response,
            Err(err) => {
                let message = login_error_message(&err);
                tracing::info!(error = %err, "login failed");
                self.state.send_modify(|state| {
                    *state = AuthState {
                        status: AuthStatus::Idle,
                        error: Some(message),
                        ..AuthState::default()
                    }
                });
                return Err(err);
            }
        };

        if let Err(err) = self.storage.set(TOKEN_KEY, &response.token).await {
            tracing::warn!(error = %err, "could not persist token; session lasts until exit");
        }
        let user = response.user;
        tracing::info!(user_id = user.id, admin = user.is_admin(), "logged in");
        self.state.send_modify(|state| {
            *state = AuthState {
                status: AuthStatus::Authenticated,
                user: Some(user.clone()),
                token: Some(response.token),
                error: None,
            }
        });
        self.emit(SessionEvent::LoggedIn(user.clone()));
        Ok(user)
    }

    /// Ends the session. The remote call is best effort; local state is always
    /// cleared.
    pub async fn logout(&self, api: &ApiClient) {
        if self.token().is_some() {
            if let Err(err) = api.logout().await {
                tracing::warn!(error = ?err, "remote logout failed; clearing local session anyway");
            }
        }
        self.discard_persisted_token().await;
        self.state.send_modify(|state| {
            *state = AuthState {
                status: AuthStatus::Idle,
                ..AuthState::default()
            }
        });
        tracing::info!("logged out");
        self.emit(SessionEvent::LoggedOut);
    }

    #[cfg(test)]
    pub(crate) fn set_authenticated_for_test(&self, user: User, token: &str) {
        self.state.send_modify(|state| {
            *state = AuthState {
                status: AuthStatus::Authenticated,
                user: Some(user),
                token: Some(token.to_string()),
                error: None,
            }
        });
    }

    /// Drops the session after the server rejected `failed_token`.
    ///
    /// Only the first of several concurrent callers does any work, and only
    /// while `failed_token` is still the active token. A request sent without
    /// a token never invalidates anything. Returns whether this call performed
    /// the invalidation.
    pub async fn force_invalidate(&self, failed_token: Option<&str>) -> bool {
        let Some(failed_token) = failed_token else {
            return false;
        };
        if self
            .invalidating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let performed = {
            let active = self.token();
            if active.as_deref() != Some(failed_token) {
                false
            } else {
                let prior = self.status();
                self.discard_persisted_token().await;
                self.state.send_modify(|state| {
                    *state = AuthState {
                        status: AuthStatus::Idle,
                        ..AuthState::default()
                    }
                });
                if prior == AuthStatus::Authenticated {
                    tracing::warn!("session expired; forcing logout");
                    self.emit(SessionEvent::Expired {
                        message: SESSION_EXPIRED_MESSAGE.to_string(),
                    });
                }
                true
            }
        };

        self.invalidating.store(false, Ordering::Release);
        performed
    }
}

/// Prefers the first `email` field error, then the server's message.
fn login_error_message(err: &ApiError) -> String {
    if let Some(msg) = err.field_error("email") {
        return msg.to_string();
    }
    match err {
        ApiError::Transport(_) => err.to_string(),
        ApiError::Validation { message, .. }
        | ApiError::Unauthorized(message)
        | ApiError::Forbidden(message)
        | ApiError::Rejected(message)
            if !message.trim().is_empty() =>
        {
            message.clone()
        }
        _ => GENERIC_LOGIN_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock::*;
    use crate::utils::storage::MemoryStore;
    use serde_json::json;

    fn user_json() -> serde_json::Value {
        json!({
            "id": 7,
            "name": "Ana Pérez",
            "email": "ana@example.com",
            "employee_detail": {
                "id": 3,
                "user_id": 7,
                "role": {
                    "id": 1,
                    "name": "RRHH",
                    "description": "Recursos humanos",
                    "salary": "3000.00",
                    "admin": true
                }
            }
        })
    }

    fn credentials() -> LoginRequest {
        LoginRequest {
            email: "ana@example.com".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn bootstrap_without_token_goes_idle() {
        let server = MockServer::start();
        let (api, session, _store) = client_with_store(&server, MemoryStore::new());

        assert_eq!(session.status(), AuthStatus::Checking);
        assert_eq!(session.bootstrap(&api).await, AuthStatus::Idle);
        assert_eq!(server.total_hits(), 0);
    }

    #[tokio::test]
    async fn bootstrap_with_valid_token_authenticates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/auth/me");
            then.status(200).envelope(user_json());
        });
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "stored-token").await.unwrap();
        let (api, session, _store) = client_with_store(&server, store);

        assert_eq!(session.bootstrap(&api).await, AuthStatus::Authenticated);
        let state = session.snapshot();
        assert!(state.is_admin());
        assert_eq!(state.token.as_deref(), Some("stored-token"));
        assert_eq!(
            server.last_request("/api/auth/me").unwrap().authorization.as_deref(),
            Some("Bearer stored-token")
        );
    }

    #[tokio::test]
    async fn bootstrap_with_rejected_token_discards_it_without_expiry_notice() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/auth/me");
            then.status(401).json_body(json!({ "message": "Unauthenticated." }));
        });
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "stale").await.unwrap();
        let (api, session, store) = client_with_store(&server, store);
        let mut events = session.events();

        assert_eq!(session.bootstrap(&api).await, AuthStatus::Idle);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert!(session.token().is_none());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn login_persists_token_and_authenticates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(200)
                .envelope(json!({ "token": "fresh", "user": user_json() }));
        });
        let (api, session, store) = client_with_store(&server, MemoryStore::new());
        let mut events = session.events();

        let user = session.login(&api, credentials()).await.unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(session.status(), AuthStatus::Authenticated);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("fresh"));
        assert!(matches!(events.try_recv(), Ok(SessionEvent::LoggedIn(_))));
    }

    #[tokio::test]
    async fn login_failure_prefers_email_field_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(422).json_body(json!({
                "message": "The given data was invalid.",
                "errors": { "email": ["Estas credenciales no coinciden."] }
            }));
        });
        let (api, session, _store) = client_with_store(&server, MemoryStore::new());

        assert!(session.login(&api, credentials()).await.is_err());
        let state = session.snapshot();
        assert_eq!(state.status, AuthStatus::Idle);
        assert_eq!(
            state.error.as_deref(),
            Some("Estas credenciales no coinciden.")
        );
    }

    #[tokio::test]
    async fn login_401_is_not_treated_as_expiry() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(401).json_body(json!({ "message": "Credenciales inválidas" }));
        });
        let (api, session, _store) = client_with_store(&server, MemoryStore::new());
        let mut events = session.events();

        assert!(session.login(&api, credentials()).await.is_err());
        assert_eq!(
            session.snapshot().error.as_deref(),
            Some("Credenciales inválidas")
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn login_transport_failure_uses_connectivity_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.transport_error();
        });
        let (api, session, _store) = client_with_store(&server, MemoryStore::new());

        let err = session.login(&api, credentials()).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(
            session.snapshot().error.as_deref(),
            Some(crate::api::CONNECTIVITY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn logout_clears_token_even_when_remote_call_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/logout");
            then.transport_error();
        });
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "t1").await.unwrap();
        let (api, session, store) = client_with_store(&server, store);
        session.state.send_modify(|state| {
            state.status = AuthStatus::Authenticated;
            state.token = Some("t1".into());
        });

        session.logout(&api).await;

        assert_eq!(server.hits(POST, "/api/auth/logout"), 1);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        let state = session.snapshot();
        assert_eq!(state.status, AuthStatus::Idle);
        assert!(state.token.is_none());
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn force_invalidate_ignores_stale_tokens() {
        let server = MockServer::start();
        let (_api, session, _store) = client_with_store(&server, MemoryStore::new());
        session.state.send_modify(|state| {
            state.status = AuthStatus::Authenticated;
            state.token = Some("current".into());
        });

        assert!(!session.force_invalidate(Some("previous")).await);
        assert!(session.snapshot().is_authenticated());
        assert!(session.force_invalidate(Some("current")).await);
        assert_eq!(session.status(), AuthStatus::Idle);
    }

    #[tokio::test]
    async fn tokenless_failure_leaves_login_in_flight() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(200)
                .envelope(json!({ "token": "fresh", "user": user_json() }))
                .delay(std::time::Duration::from_millis(40));
        });
        let (api, session, _store) = client_with_store(&server, MemoryStore::new());

        let login = {
            let session = session.clone();
            tokio::spawn(async move { session.login(&api, credentials()).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(session.status(), AuthStatus::Loading);

        assert!(!session.force_invalidate(None).await);
        assert_eq!(session.status(), AuthStatus::Loading);

        login.await.unwrap().unwrap();
        assert_eq!(session.status(), AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn force_invalidate_without_token_keeps_login_error() {
        let server = MockServer::start();
        let (_api, session, _store) = client_with_store(&server, MemoryStore::new());
        session.state.send_modify(|state| {
            state.status = AuthStatus::Idle;
            state.error = Some("Credenciales inválidas".into());
        });

        assert!(!session.force_invalidate(None).await);
        assert_eq!(
            session.snapshot().error.as_deref(),
            Some("Credenciales inválidas")
        );
    }

    #[test]
    fn login_error_message_falls_back_to_generic_text() {
        let err = ApiError::Server {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(login_error_message(&err), GENERIC_LOGIN_ERROR);
    }
}
