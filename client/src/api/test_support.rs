#[cfg(test)]
pub mod mock {
    use crate::api::transport::{RawResponse, Transport};
    use crate::api::{ApiClient, ApiError, User};
    use crate::state::auth::SessionStore;
    use crate::utils::storage::{MemoryStore, SecureStore};
    use async_trait::async_trait;
    use reqwest::{header, Method, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    pub const GET: Method = Method::GET;
    pub const POST: Method = Method::POST;
    pub const PUT: Method = Method::PUT;
    pub const DELETE: Method = Method::DELETE;

    #[derive(Clone)]
    pub struct MockServer {
        inner: Arc<Mutex<Inner>>,
        base: String,
        http: reqwest::Client,
    }

    #[derive(Default)]
    struct Inner {
        routes: Vec<Route>,
        requests: Vec<RecordedRequest>,
    }

    #[derive(Clone)]
    struct Route {
        method: Method,
        path: String,
        reply: Reply,
    }

    #[derive(Clone)]
    enum Reply {
        Respond {
            status: u16,
            body: Value,
            delay: Option<Duration>,
        },
        TransportError,
    }

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub path: String,
        pub query: Option<String>,
        pub authorization: Option<String>,
        pub request_id: Option<String>,
        pub content_type: Option<String>,
        pub body: Option<Value>,
    }

    impl MockServer {
        pub async fn start_async() -> Self {
            Self::start()
        }

        pub fn start() -> Self {
            static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
            let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            Self {
                inner: Arc::new(Mutex::new(Inner::default())),
                base: format!("http://mock-{}", id),
                http: reqwest::Client::builder()
                    .build()
                    .expect("mock http client"),
            }
        }

        pub fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        pub fn mock<F>(&self, f: F)
        where
            F: FnOnce(&mut When, &mut Then),
        {
            let mut when = When::default();
            let mut then = Then::default();
            f(&mut when, &mut then);

            let method = when.method.clone().expect("mock requires method");
            let path = when.path.clone().expect("mock requires path");
            let reply = if then.transport_error {
                Reply::TransportError
            } else {
                Reply::Respond {
                    status: then.status.unwrap_or(200),
                    body: then.body.unwrap_or_else(|| json!({})),
                    delay: then.delay,
                }
            };

            let mut inner = self.inner.lock().expect("mock lock");
            inner.routes.push(Route {
                method,
                path,
                reply,
            });
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.inner.lock().expect("mock lock").requests.clone()
        }

        pub fn hits(&self, method: Method, path: &str) -> usize {
            self.requests()
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .count()
        }

        pub fn total_hits(&self) -> usize {
            self.requests().len()
        }

        pub fn last_request(&self, path: &str) -> Option<RecordedRequest> {
            self.requests().into_iter().rev().find(|r| r.path == path)
        }
    }

    #[async_trait]
    impl Transport for MockServer {
        fn client(&self) -> &reqwest::Client {
            &self.http
        }

        async fn execute(&self, request: reqwest::Request) -> Result<RawResponse, ApiError> {
            let header_value = |name: &str| {
                request
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let recorded = RecordedRequest {
                method: request.method().clone(),
                path: request.url().path().to_string(),
                query: request.url().query().map(str::to_string),
                authorization: header_value(header::AUTHORIZATION.as_str()),
                request_id: header_value(crate::api::REQUEST_ID_HEADER),
                content_type: header_value(header::CONTENT_TYPE.as_str()),
                body: request
                    .body()
                    .and_then(|b| b.as_bytes())
                    .and_then(|bytes| serde_json::from_slice(bytes).ok()),
            };

            let route = {
                let mut inner = self
                    .inner
                    .lock()
                    .map_err(|_| ApiError::request_failed("mock lock"))?;
                inner.requests.push(recorded.clone());
                inner
                    .routes
                    .iter()
                    .rev()
                    .find(|route| route.method == recorded.method && route.path == recorded.path)
                    .cloned()
            };

            let Some(route) = route else {
                return Err(ApiError::request_failed(format!(
                    "No mock for {} {}",
                    recorded.method, recorded.path
                )));
            };

            match route.reply {
                Reply::TransportError => Err(ApiError::request_failed("connection refused")),
                Reply::Respond {
                    status,
                    body,
                    delay,
                } => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(RawResponse {
                        status: StatusCode::from_u16(status).expect("valid status"),
                        body: serde_json::to_vec(&body).expect("serializable body"),
                    })
                }
            }
        }
    }

    #[derive(Default)]
    pub struct When {
        method: Option<Method>,
        path: Option<String>,
    }

    impl When {
        pub fn method(&mut self, method: Method) -> &mut Self {
            self.method = Some(method);
            self
        }

        pub fn path(&mut self, path: &str) -> &mut Self {
            self.path = Some(path.to_string());
            self
        }
    }

    #[derive(Default)]
    pub struct Then {
        status: Option<u16>,
        body: Option<Value>,
        delay: Option<Duration>,
        transport_error: bool,
    }

    impl Then {
        pub fn status(&mut self, status: u16) -> &mut Self {
            self.status = Some(status);
            self
        }

        pub fn json_body(&mut self, body: Value) -> &mut Self {
            self.body = Some(body);
            self
        }

        /// Wraps `data` in a successful `{status, message, data}` envelope.
        pub fn envelope(&mut self, data: Value) -> &mut Self {
            self.json_body(json!({ "status": true, "message": "OK", "data": data }))
        }

        pub fn delay(&mut self, delay: Duration) -> &mut Self {
            self.delay = Some(delay);
            self
        }

        pub fn transport_error(&mut self) -> &mut Self {
            self.transport_error = true;
            self
        }
    }

    pub fn client_with_store<S>(
        server: &MockServer,
        store: S,
    ) -> (ApiClient, Arc<SessionStore>, Arc<S>)
    where
        S: SecureStore + 'static,
    {
        let store = Arc::new(store);
        let session = Arc::new(SessionStore::new(store.clone()));
        let api = ApiClient::with_transport(
            server.url("/api"),
            Arc::new(server.clone()),
            session.clone(),
        );
        (api, session, store)
    }

    pub fn client(server: &MockServer) -> (ApiClient, Arc<SessionStore>) {
        let (api, session, _) = client_with_store(server, MemoryStore::new());
        (api, session)
    }

    pub fn authenticated_client(
        server: &MockServer,
        token: &str,
    ) -> (ApiClient, Arc<SessionStore>) {
        let (api, session) = client(server);
        session.set_authenticated_for_test(employee(), token);
        (api, session)
    }

    pub fn employee() -> User {
        serde_json::from_value(json!({
            "id": 7,
            "name": "Ana Pérez",
            "email": "ana@example.com",
            "employee_detail": null
        }))
        .expect("user fixture")
    }
}
