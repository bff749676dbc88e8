use reqwest::Method;
use serde_json::json;

use super::{
    client::{decode_envelope, ApiClient, OnUnauthorized},
    error::ApiError,
    types::{LoginRequest, LoginResponse, User},
};

impl ApiClient {
    /// A 401 here means bad credentials, so it never triggers a forced logout.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let builder = self.request(Method::POST, "/auth/login").json(request);
        let body = self.send(builder, OnUnauthorized::Report).await?;
        decode_envelope::<LoginResponse>(&body)?.into_data()
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.send_json(self.request(Method::GET, "/auth/me")).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, "/auth/logout").json(&json!({}));
        let body = self.send(builder, OnUnauthorized::Report).await?;
        decode_envelope::<serde_json::Value>(&body)?.into_unit()
    }
}
