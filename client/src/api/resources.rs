//! Generic CRUD over the backend's named resources.
//!
//! Each resource is a marker type naming its path, its item type and the
//! cache key its list views depend on. Operations map one-to-one onto HTTP
//! calls: no joining, paging or caching happens here.

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use super::{
    client::ApiClient,
    error::ApiError,
    types::{
        Branch, BranchPayload, Company, CompanyPayload, CreateEarlyDepartureRequest, Department,
        DepartmentPayload, Document, EarlyDepartureRequest, EmployeeDetail,
        EmployeeDetailPayload, EmployeeState, EmployeeStatePayload, Filters, Id, Role,
        RolePayload, Schedule, SchedulePayload, User, UserPayload, WorkSession,
    },
};
use crate::state::cache::CacheKey;

pub trait Resource: Send + Sync + 'static {
    type Item: DeserializeOwned + Clone + Send + Sync + 'static;
    const PATH: &'static str;
    const CACHE_KEY: CacheKey;
}

/// Resources accepting JSON create/update bodies (full replace on update).
pub trait Writable: Resource {
    type Payload: Serialize + Send + Sync;
}

macro_rules! resource {
    ($name:ident, $item:ty, $path:literal, $key:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Resource for $name {
            type Item = $item;
            const PATH: &'static str = $path;
            const CACHE_KEY: CacheKey = $key;
        }
    };
    ($name:ident, $item:ty, $path:literal, $key:expr, payload = $payload:ty) => {
        resource!($name, $item, $path, $key);

        impl Writable for $name {
            type Payload = $payload;
        }
    };
}

resource!(MyAttendance, WorkSession, "/employee/attendance", CacheKey::Attendance);
resource!(MyDocuments, Document, "/employee/documents", CacheKey::Documents);
resource!(
    MyEarlyRequests,
    EarlyDepartureRequest,
    "/employee/early-departure-requests",
    CacheKey::EarlyRequests,
    payload = CreateEarlyDepartureRequest
);

resource!(
    Users,
    User,
    "/admin/users",
    CacheKey::Admin("users"),
    payload = UserPayload
);
resource!(
    Companies,
    Company,
    "/admin/companies",
    CacheKey::Admin("companies"),
    payload = CompanyPayload
);
resource!(
    Branches,
    Branch,
    "/admin/branches",
    CacheKey::Admin("branches"),
    payload = BranchPayload
);
resource!(
    Departments,
    Department,
    "/admin/departments",
    CacheKey::Admin("departments"),
    payload = DepartmentPayload
);
resource!(
    Roles,
    Role,
    "/admin/roles",
    CacheKey::Admin("roles"),
    payload = RolePayload
);
resource!(
    Schedules,
    Schedule,
    "/admin/schedules",
    CacheKey::Admin("schedules"),
    payload = SchedulePayload
);
resource!(
    EmployeeStates,
    EmployeeState,
    "/admin/employee-states",
    CacheKey::Admin("employee-states"),
    payload = EmployeeStatePayload
);
resource!(
    EmployeeDetails,
    EmployeeDetail,
    "/admin/employee-details",
    CacheKey::Admin("employee-details"),
    payload = EmployeeDetailPayload
);
resource!(
    AdminDocuments,
    Document,
    "/admin/documents",
    CacheKey::Admin("documents")
);
resource!(
    AdminAttendance,
    WorkSession,
    "/admin/attendance",
    CacheKey::Admin("attendance")
);
resource!(
    AdminEarlyRequests,
    EarlyDepartureRequest,
    "/admin/early-departure-requests",
    CacheKey::Admin("early-requests")
);

impl ApiClient {
    pub async fn list<R: Resource>(&self, filters: &Filters) -> Result<Vec<R::Item>, ApiError> {
        let mut builder = self.request(Method::GET, R::PATH);
        if !filters.is_empty() {
            builder = builder.query(filters);
        }
        self.send_json(builder).await
    }

    pub async fn get<R: Resource>(&self, id: Id) -> Result<R::Item, ApiError> {
        self.send_json(self.request(Method::GET, &item_path::<R>(id)))
            .await
    }

    pub async fn create<R: Writable>(&self, payload: &R::Payload) -> Result<R::Item, ApiError> {
        self.send_json(self.request(Method::POST, R::PATH).json(payload))
            .await
    }

    pub async fn update<R: Writable>(
        &self,
        id: Id,
        payload: &R::Payload,
    ) -> Result<R::Item, ApiError> {
        self.send_json(self.request(Method::PUT, &item_path::<R>(id)).json(payload))
            .await
    }

    pub async fn delete<R: Resource>(&self, id: Id) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &item_path::<R>(id)))
            .await
    }
}

pub(crate) fn item_path<R: Resource>(id: Id) -> String {
    format!("{}/{}", R::PATH, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_resources_use_namespaced_cache_keys() {
        assert_eq!(Roles::CACHE_KEY.to_string(), "admin:roles");
        assert_eq!(EmployeeStates::CACHE_KEY.to_string(), "admin:employee-states");
        assert_eq!(MyEarlyRequests::CACHE_KEY.to_string(), "early-requests");
    }

    #[test]
    fn item_path_appends_id() {
        assert_eq!(item_path::<Branches>(12), "/admin/branches/12");
        assert_eq!(item_path::<MyDocuments>(3), "/employee/documents/3");
    }
}
