use reqwest::Method;
use serde_json::json;

use super::{
    client::ApiClient,
    error::ApiError,
    resources::{AdminAttendance, MyAttendance, Resource},
    types::{AttendanceLocation, Filters, WorkSession},
};

impl ApiClient {
    pub async fn my_attendance(&self, filters: &Filters) -> Result<Vec<WorkSession>, ApiError> {
        self.list::<MyAttendance>(filters).await
    }

    pub async fn start_work(&self, location: AttendanceLocation) -> Result<WorkSession, ApiError> {
        self.attendance_action("start", Some(location)).await
    }

    pub async fn start_lunch(&self) -> Result<WorkSession, ApiError> {
        self.attendance_action("lunch-start", None).await
    }

    pub async fn end_lunch(&self) -> Result<WorkSession, ApiError> {
        self.attendance_action("lunch-end", None).await
    }

    pub async fn end_work(&self, location: AttendanceLocation) -> Result<WorkSession, ApiError> {
        self.attendance_action("end", Some(location)).await
    }

    async fn attendance_action(
        &self,
        action: &str,
        location: Option<AttendanceLocation>,
    ) -> Result<WorkSession, ApiError> {
        let path = format!("{}/{}", MyAttendance::PATH, action);
        let body = match location {
            Some(location) => serde_json::to_value(location)
                .map_err(|e| ApiError::Decode(e.to_string()))?,
            None => json!({}),
        };
        self.send_json(self.request(Method::POST, &path).json(&body))
            .await
    }

    pub async fn admin_attendance(&self, filters: &Filters) -> Result<Vec<WorkSession>, ApiError> {
        self.list::<AdminAttendance>(filters).await
    }

    /// Every employee's records, unfiltered by the server's default day.
    pub async fn admin_attendance_all(
        &self,
        filters: &Filters,
    ) -> Result<Vec<WorkSession>, ApiError> {
        let path = format!("{}/all", AdminAttendance::PATH);
        let mut builder = self.request(Method::GET, &path);
        if !filters.is_empty() {
            builder = builder.query(filters);
        }
        self.send_json(builder).await
    }
}
