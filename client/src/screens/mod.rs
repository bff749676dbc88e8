//! Headless controllers behind each screen. They own form state and user
//! feedback, read lists through the shared [`QueryCache`](crate::state::cache::QueryCache)
//! and push every mutation through it.

pub mod admin;
pub mod attendance;
pub mod documents;
pub mod requests;

use crate::api::ApiError;

/// Outcome of the last user action, shown as a banner or toast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageState {
    pub success: Option<String>,
    pub error: Option<ApiError>,
}

impl MessageState {
    pub fn set_success(&mut self, msg: impl Into<String>) {
        self.success = Some(msg.into());
        self.error = None;
    }

    pub fn set_error(&mut self, err: ApiError) {
        self.error = Some(err);
        self.success = None;
    }

    pub fn clear(&mut self) {
        self.success = None;
        self.error = None;
    }

    /// Records `result` and hands it back unchanged.
    pub(crate) fn record<T>(
        &mut self,
        result: Result<T, ApiError>,
        success: &str,
    ) -> Result<T, ApiError> {
        match &result {
            Ok(_) => self.set_success(success),
            Err(err) => self.set_error(err.clone()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_state_keeps_only_latest_outcome() {
        let mut msg = MessageState::default();
        msg.set_success("Guardado");
        msg.set_error(ApiError::NotFound("No existe".into()));
        assert!(msg.success.is_none());
        assert_eq!(msg.error, Some(ApiError::NotFound("No existe".into())));
        msg.clear();
        assert_eq!(msg, MessageState::default());
    }
}
