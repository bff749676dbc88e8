use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use std::time::Duration;

use super::error::ApiError;

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Executes a fully built request. Production code goes over the network;
/// tests plug in a scripted responder.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Client whose builders produce the requests passed to `execute`.
    fn client(&self) -> &Client;

    async fn execute(&self, request: Request) -> Result<RawResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::request_failed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn client(&self) -> &Client {
        &self.client
    }

    async fn execute(&self, request: Request) -> Result<RawResponse, ApiError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ApiError::request_failed(format!("Request failed: {e}")))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::request_failed(format!("Failed to read response: {e}")))?;
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
