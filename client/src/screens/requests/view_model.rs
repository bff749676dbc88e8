use chrono_tz::Tz;

use crate::api::{ApiClient, ApiError, EarlyDepartureRequest};
use crate::screens::MessageState;
use crate::state::cache::{CacheKey, QueryCache};

use super::form::EarlyRequestForm;

const SUBMITTED: &str = "Solicitud enviada.";

/// Employee side of early-departure requests: own list plus the creation
/// form.
#[derive(Clone)]
pub struct RequestsViewModel {
    api: ApiClient,
    cache: QueryCache,
    time_zone: Tz,
    pub form: EarlyRequestForm,
    pub message: MessageState,
}

impl RequestsViewModel {
    pub fn new(api: ApiClient, cache: QueryCache, time_zone: Tz) -> Self {
        Self {
            api,
            cache,
            time_zone,
            form: EarlyRequestForm::defaults(time_zone),
            message: MessageState::default(),
        }
    }

    pub async fn requests(&self) -> Result<Vec<EarlyDepartureRequest>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch(CacheKey::EarlyRequests, || async move {
                api.my_early_requests().await
            })
            .await
    }

    /// Validates and submits the form. The form is reset only on success;
    /// on failure it keeps the user's input.
    pub async fn submit(&mut self) -> Result<EarlyDepartureRequest, ApiError> {
        let result = match self.form.to_payload() {
            Ok(payload) => {
                let api = self.api.clone();
                self.cache
                    .mutate(vec![CacheKey::EarlyRequests], async move {
                        api.create_early_request(&payload).await
                    })
                    .await
            }
            Err(err) => Err(err),
        };
        if result.is_ok() {
            self.form.reset(self.time_zone);
        }
        self.message.record(result, SUBMITTED)
    }
}
