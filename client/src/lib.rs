//! Headless core of the staffdesk HR client: API gateway, session and cache
//! state, and the controllers behind each screen.

pub mod api;
pub mod config;
pub mod screens;
pub mod state;
pub mod utils;

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use api::{ApiClient, ApiError, LoginRequest, Resource, Transport, User};
use config::AppConfig;
use screens::{
    admin::{AdminCrud, AdminRequestsViewModel},
    attendance::AttendanceViewModel,
    documents::DocumentsViewModel,
    requests::RequestsViewModel,
};
use state::{
    auth::{AuthStatus, SessionEvent, SessionStore},
    cache::QueryCache,
    theme::ThemeStore,
};
use utils::storage::SecureStore;

/// Process-wide application context. Created once at startup; screens get
/// their controllers from here.
#[derive(Clone)]
pub struct StaffDesk {
    pub config: AppConfig,
    pub api: ApiClient,
    pub session: Arc<SessionStore>,
    pub cache: QueryCache,
    pub theme: Arc<ThemeStore>,
}

impl StaffDesk {
    pub fn new(config: AppConfig, storage: Arc<dyn SecureStore>) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::new(storage.clone()));
        let api = ApiClient::new(&config, session.clone())?;
        Ok(Self::assemble(config, api, session, storage))
    }

    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn SecureStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage.clone()));
        let api =
            ApiClient::with_transport(config.api_base_url.clone(), transport, session.clone());
        Self::assemble(config, api, session, storage)
    }

    fn assemble(
        config: AppConfig,
        api: ApiClient,
        session: Arc<SessionStore>,
        storage: Arc<dyn SecureStore>,
    ) -> Self {
        Self {
            config,
            api,
            session,
            cache: QueryCache::new(),
            theme: Arc::new(ThemeStore::new(storage)),
        }
    }

    /// Restores the theme and any persisted session.
    pub async fn bootstrap(&self) -> AuthStatus {
        let theme = self.theme.load().await;
        tracing::debug!(%theme, "theme loaded");
        self.session.bootstrap(&self.api).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let user = self.session.login(&self.api, request).await?;
        self.cache.clear();
        Ok(user)
    }

    pub async fn logout(&self) {
        self.session.logout(&self.api).await;
        self.cache.clear();
    }

    /// Drops cached lists whenever the session ends, including forced
    /// expiry. Runs until the session store goes away.
    pub fn spawn_session_listener(&self) -> JoinHandle<()> {
        let mut events = self.session.events();
        let cache = self.cache.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired { message }) => {
                        tracing::info!(%message, "session expired");
                        cache.clear();
                    }
                    Ok(SessionEvent::LoggedOut) => cache.clear(),
                    Ok(SessionEvent::LoggedIn(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session listener lagged");
                        cache.clear();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn attendance(&self) -> AttendanceViewModel {
        AttendanceViewModel::new(self.api.clone(), self.cache.clone())
    }

    pub fn requests(&self) -> RequestsViewModel {
        RequestsViewModel::new(self.api.clone(), self.cache.clone(), self.config.time_zone)
    }

    pub fn documents(&self) -> DocumentsViewModel {
        DocumentsViewModel::new(self.api.clone(), self.cache.clone())
    }

    pub fn admin_requests(&self) -> AdminRequestsViewModel {
        AdminRequestsViewModel::new(self.api.clone(), self.cache.clone())
    }

    pub fn admin<R: Resource>(&self) -> AdminCrud<R> {
        AdminCrud::new(self.api.clone(), self.cache.clone())
    }
}
