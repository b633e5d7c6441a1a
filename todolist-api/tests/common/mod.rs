/// Common test utilities for integration tests
///
/// - In-memory store, so no database is needed
/// - Cheap Argon2 parameters to keep registration fast
/// - Request helpers returning `(status, json body)`

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use todolist_api::app::{build_router, AppState};
use todolist_api::config::Config;
use todolist_shared::auth::middleware::Identity;
use todolist_shared::auth::password::Argon2Hasher;
use todolist_shared::models::TodoList;
use todolist_shared::pagination::{PageQuery, PaginationConfig};
use todolist_shared::store::{memory::InMemoryStore, Store};
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the app and its backing store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<InMemoryStore>,
    pub config: Config,
}

impl TestContext {
    /// Default configuration with in-memory storage
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// `/register` and `/login` refuse callers that already hold a valid token
    pub fn strict() -> Self {
        Self::with_vars(&[("AUTH_REJECT_AUTHENTICATED", "true")])
    }

    /// Default configuration overridden by `vars`
    pub fn with_vars(vars: &[(&str, &str)]) -> Self {
        let mut map: HashMap<String, String> = HashMap::from([
            ("STORAGE_BACKEND".to_string(), "memory".to_string()),
            ("JWT_SECRET".to_string(), TEST_SECRET.to_string()),
        ]);
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }

        let config = Config::from_lookup(|key| map.get(key).cloned()).unwrap();
        let store = Arc::new(InMemoryStore::new());
        let hasher = Arc::new(Argon2Hasher::with_params(4096, 1, 1).unwrap());

        let state = AppState::with_hasher(store.clone(), config.clone(), hasher);
        let app = build_router(state);

        TestContext { app, store, config }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies parse as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user and returns their token
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({ "email": email, "name": "Test User", "password": "pw123456" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a list and returns its ID
    pub async fn create_list(&self, token: &str, name: &str) -> String {
        let (status, body) = self.post("/api/lists", token, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "create list failed: {}", body);

        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a task in `list_id` and returns its ID
    pub async fn create_task(&self, token: &str, list_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/lists/{}/tasks", list_id),
                token,
                json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);

        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Lists owned by `identity`, read straight from the store
    pub async fn lists_of(&self, identity: &Identity) -> Vec<TodoList> {
        let page = PaginationConfig::default()
            .resolve(PageQuery::default())
            .unwrap();
        self.store.lists().page(identity.user_id, page).await.unwrap()
    }
}
