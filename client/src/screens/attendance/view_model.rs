use crate::api::{ApiClient, ApiError, AttendanceLocation, Filters, WorkSession};
use crate::screens::MessageState;
use crate::state::attendance::{
    current_session, derive_stage, enabled_actions, is_action_enabled, AttendanceAction, WorkStage,
};
use crate::state::cache::{CacheKey, QueryCache};

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceOverview {
    pub sessions: Vec<WorkSession>,
    pub current: Option<WorkSession>,
    pub stage: WorkStage,
    pub enabled: Vec<AttendanceAction>,
}

impl AttendanceOverview {
    pub fn from_sessions(sessions: Vec<WorkSession>) -> Self {
        let current = current_session(&sessions).cloned();
        if let Some(violation) = current.as_ref().and_then(WorkSession::ordering_violation) {
            tracing::warn!(
                session_id = current.as_ref().map(|s| s.id),
                ?violation,
                "server returned out-of-order timestamps; using record as is"
            );
        }
        let stage = derive_stage(current.as_ref());
        let enabled = enabled_actions(current.as_ref());
        Self {
            sessions,
            current,
            stage,
            enabled,
        }
    }

    pub fn is_enabled(&self, action: AttendanceAction) -> bool {
        self.enabled.contains(&action)
    }
}

#[derive(Clone)]
pub struct AttendanceViewModel {
    api: ApiClient,
    cache: QueryCache,
    pub message: MessageState,
}

impl AttendanceViewModel {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            message: MessageState::default(),
        }
    }

    pub async fn sessions(&self) -> Result<Vec<WorkSession>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch(CacheKey::Attendance, || async move {
                api.my_attendance(&Filters::new()).await
            })
            .await
    }

    pub async fn overview(&self) -> Result<AttendanceOverview, ApiError> {
        self.sessions().await.map(AttendanceOverview::from_sessions)
    }

    /// Runs `action` against the server. Actions the current record does not
    /// allow are refused without a request. The mutation keeps running if
    /// the caller stops waiting.
    pub async fn perform(
        &mut self,
        action: AttendanceAction,
        location: AttendanceLocation,
    ) -> Result<WorkSession, ApiError> {
        let result = self.run(action, location).await;
        if let Err(err) = &result {
            tracing::info!(%action, error = %err, "attendance action failed");
        }
        self.message.record(result, success_message(action))
    }

    async fn run(
        &self,
        action: AttendanceAction,
        location: AttendanceLocation,
    ) -> Result<WorkSession, ApiError> {
        let overview = self.overview().await?;
        if !is_action_enabled(overview.current.as_ref(), action) {
            return Err(ApiError::field(
                "action",
                format!(
                    "La acción \"{}\" no está disponible en la etapa {}.",
                    action.label(),
                    overview.stage
                ),
            ));
        }

        let api = self.api.clone();
        self.cache
            .mutate(vec![CacheKey::Attendance], async move {
                match action {
                    AttendanceAction::Start => api.start_work(location).await,
                    AttendanceAction::StartLunch => api.start_lunch().await,
                    AttendanceAction::EndLunch => api.end_lunch().await,
                    AttendanceAction::End => api.end_work(location).await,
                }
            })
            .await
    }
}

fn success_message(action: AttendanceAction) -> &'static str {
    match action {
        AttendanceAction::Start => "Jornada iniciada.",
        AttendanceAction::StartLunch => "Almuerzo iniciado.",
        AttendanceAction::EndLunch => "Almuerzo terminado.",
        AttendanceAction::End => "Jornada terminada.",
    }
}
