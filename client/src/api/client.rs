use reqwest::{header, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    transport::{RawResponse, ReqwestTransport, Transport},
    types::Envelope,
};
use crate::{config::AppConfig, state::auth::SessionStore};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Typed gateway to the HR backend. Every operation is one HTTP call; the
/// bearer token is read from the shared [`SessionStore`] at send time.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    transport: Arc<dyn Transport>,
    base_url: String,
    session: Arc<SessionStore>,
}

/// Whether a 401 on this call means the active session expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnUnauthorized {
    ForceLogout,
    Report,
}

impl ApiClient {
    pub fn new(config: &AppConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(
            config.api_base_url.clone(),
            Arc::new(transport),
            session,
        ))
    }

    pub fn with_transport(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            http: transport.client().clone(),
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
    }

    /// Sends the request and returns the raw body of a successful response.
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
        on_unauthorized: OnUnauthorized,
    ) -> Result<Vec<u8>, ApiError> {
        let token = self.session.token();
        let builder = match token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let request = builder
            .build()
            .map_err(|e| ApiError::request_failed(format!("Invalid request: {e}")))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        tracing::debug!(%method, %path, "sending request");
        let RawResponse { status, body } = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%method, %path, error = ?err, "request did not complete");
                return Err(err);
            }
        };
        tracing::debug!(%method, %path, status = status.as_u16(), "received response");

        if status.is_success() {
            return Ok(body);
        }

        let error = ApiError::from_response(status, &body);
        if error.is_unauthorized() && on_unauthorized == OnUnauthorized::ForceLogout {
            self.session.force_invalidate(token.as_deref()).await;
        }
        Err(error)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(builder, OnUnauthorized::ForceLogout).await?;
        decode_envelope::<T>(&body)?.into_data()
    }

    pub(crate) async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let body = self.send(builder, OnUnauthorized::ForceLogout).await?;
        decode_envelope::<serde_json::Value>(&body)?.into_unit()
    }
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<Envelope<T>, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
