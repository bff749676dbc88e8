use crate::api::resources::{AdminEarlyRequests, MyEarlyRequests};
use crate::api::{ApiClient, ApiError, EarlyDepartureRequest, Filters, Id, Resource};
use crate::screens::MessageState;
use crate::state::cache::{CacheKey, QueryCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Approve,
    Reject,
}

/// Only pending requests are offered for review. Whether a request is still
/// pending when the call lands is for the server to decide.
pub fn actions_for(request: &EarlyDepartureRequest) -> Vec<RequestAction> {
    if request.status.is_resolved() {
        Vec::new()
    } else {
        vec![RequestAction::Approve, RequestAction::Reject]
    }
}

#[derive(Clone)]
pub struct AdminRequestsViewModel {
    api: ApiClient,
    cache: QueryCache,
    pub message: MessageState,
}

impl AdminRequestsViewModel {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            message: MessageState::default(),
        }
    }

    pub async fn requests(&self) -> Result<Vec<EarlyDepartureRequest>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch(AdminEarlyRequests::CACHE_KEY, || async move {
                api.admin_early_requests(&Filters::new()).await
            })
            .await
    }

    pub async fn approve(&mut self, id: Id) -> Result<EarlyDepartureRequest, ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .mutate(review_keys(), async move { api.approve_early_request(id).await })
            .await;
        self.message.record(result, "Solicitud aprobada.")
    }

    pub async fn reject(
        &mut self,
        id: Id,
        reason: Option<String>,
    ) -> Result<EarlyDepartureRequest, ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .mutate(review_keys(), async move {
                api.reject_early_request(id, reason).await
            })
            .await;
        self.message.record(result, "Solicitud rechazada.")
    }
}

fn review_keys() -> Vec<CacheKey> {
    vec![AdminEarlyRequests::CACHE_KEY, MyEarlyRequests::CACHE_KEY]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock::*;
    use crate::api::RequestStatus;
    use serde_json::json;

    fn request(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": 7,
            "description": "Cita médica",
            "request_date": "2024-03-01",
            "request_time": "09:30",
            "status": status
        })
    }

    #[test]
    fn only_pending_requests_offer_actions() {
        let mut item: EarlyDepartureRequest =
            serde_json::from_value(request(1, "pending")).unwrap();
        assert_eq!(
            actions_for(&item),
            vec![RequestAction::Approve, RequestAction::Reject]
        );
        item.status = RequestStatus::Approved;
        assert!(actions_for(&item).is_empty());
        item.status = RequestStatus::Rejected;
        assert!(actions_for(&item).is_empty());
    }

    #[tokio::test]
    async fn approve_invalidates_admin_and_employee_lists() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/early-departure-requests/1/approve");
            then.status(200).envelope(request(1, "approved"));
        });
        let (api, _session) = authenticated_client(&server, "tok");
        let cache = QueryCache::new();
        let mut vm = AdminRequestsViewModel::new(api, cache.clone());

        let approved = vm.approve(1).await.unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(cache.invalidation_count(CacheKey::Admin("early-requests")), 1);
        assert_eq!(cache.invalidation_count(CacheKey::EarlyRequests), 1);
    }

    #[tokio::test]
    async fn rejecting_a_resolved_request_reports_the_server_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/early-departure-requests/2/reject");
            then.status(409)
                .json_body(json!({ "message": "La solicitud ya fue procesada." }));
        });
        let (api, _session) = authenticated_client(&server, "tok");
        let cache = QueryCache::new();
        let mut vm = AdminRequestsViewModel::new(api, cache.clone());

        let err = vm.reject(2, Some("Sin cobertura".into())).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Conflict("La solicitud ya fue procesada.".into())
        );
        assert_eq!(cache.invalidation_count(CacheKey::EarlyRequests), 0);
    }
}
