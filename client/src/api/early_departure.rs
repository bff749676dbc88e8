use reqwest::Method;
use serde_json::json;

use super::{
    client::ApiClient,
    error::ApiError,
    resources::{item_path, AdminEarlyRequests, MyEarlyRequests},
    types::{
        CreateEarlyDepartureRequest, EarlyDepartureRequest, Filters, Id,
        RejectEarlyDepartureRequest,
    },
};

impl ApiClient {
    pub async fn my_early_requests(&self) -> Result<Vec<EarlyDepartureRequest>, ApiError> {
        self.list::<MyEarlyRequests>(&Filters::new()).await
    }

    pub async fn create_early_request(
        &self,
        payload: &CreateEarlyDepartureRequest,
    ) -> Result<EarlyDepartureRequest, ApiError> {
        self.create::<MyEarlyRequests>(payload).await
    }

    pub async fn admin_early_requests(
        &self,
        filters: &Filters,
    ) -> Result<Vec<EarlyDepartureRequest>, ApiError> {
        self.list::<AdminEarlyRequests>(filters).await
    }

    /// The server alone decides whether the request is still pending.
    pub async fn approve_early_request(&self, id: Id) -> Result<EarlyDepartureRequest, ApiError> {
        let path = format!("{}/approve", item_path::<AdminEarlyRequests>(id));
        self.send_json(self.request(Method::POST, &path).json(&json!({})))
            .await
    }

    pub async fn reject_early_request(
        &self,
        id: Id,
        reason: Option<String>,
    ) -> Result<EarlyDepartureRequest, ApiError> {
        let path = format!("{}/reject", item_path::<AdminEarlyRequests>(id));
        let body = RejectEarlyDepartureRequest {
            reason: reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        };
        self.send_json(self.request(Method::POST, &path).json(&body))
            .await
    }
}
