#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::Extension;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode};
use classbase::router::init_router;
use classbase::state::AppState;
use classbase_auth::MemoryIdentity;
use classbase_config::RateLimitConfig;
use classbase_models::UserDocument;
use classbase_models::collections::{class_path, user_path};
use classbase_store::{DocumentStore, Fields, MemoryStore};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use tower::ServiceExt;

pub const PROJECT_ID: &str = "classbase-test";

/// In-memory backends plus the router serving them.
pub struct TestApp {
    pub identity: Arc<MemoryIdentity>,
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(RateLimitConfig::disabled(), None)
    }

    /// Rate limits enabled, every request arriving from `peer`.
    pub fn with_rate_limit(config: RateLimitConfig, peer: SocketAddr) -> Self {
        let mut app = Self::build(config, None);
        app.router = app.router.layer(Extension(ConnectInfo(peer)));
        app
    }

    pub fn with_metrics(handle: PrometheusHandle) -> Self {
        Self::build(RateLimitConfig::disabled(), Some(handle))
    }

    pub fn build(rate_limit_config: RateLimitConfig, metrics: Option<PrometheusHandle>) -> Self {
        let identity = Arc::new(MemoryIdentity::new(PROJECT_ID));
        let store = Arc::new(MemoryStore::new());
        let mut state = AppState::new(identity.clone(), store.clone());
        state.rate_limit_config = rate_limit_config;
        let router = init_router(state, metrics).unwrap();
        Self {
            identity,
            store,
            router,
        }
    }

    /// Seeds an identity and its user document, returning a fresh ID token.
    pub async fn seed_user(&self, uid: &str, role: &str, class_id: &str) -> String {
        let email = format!("{uid}@example.com");
        self.identity.insert_user(uid, &email, Some(role)).await;
        let document = UserDocument {
            email,
            name: format!("User {uid}"),
            role: role.to_string(),
            class_id: class_id.to_string(),
        };
        self.store
            .set(&user_path(uid).unwrap(), document.into_fields())
            .await
            .unwrap();
        self.identity.issue_id_token(uid).await.unwrap()
    }

    pub async fn seed_class(&self, class_id: &str, title: &str) {
        let mut fields = Fields::new();
        fields.insert("title".into(), title.into());
        self.store.set(&class_path(class_id), fields).await.unwrap();
    }

    pub async fn admin_token(&self) -> String {
        self.seed_user("admin-1", "admin", "staff").await
    }

    pub async fn teacher_token(&self) -> String {
        self.seed_user("teacher-1", "teacher", "c1").await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, None)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Asserts the error envelope and returns nothing else of interest.
pub fn assert_error(status: StatusCode, body: &Value, expected: StatusCode, message: &str) {
    assert_eq!(status, expected, "unexpected status, body: {body}");
    assert_eq!(body["status"], expected.as_u16());
    assert_eq!(body["message"], message);
    assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}
