#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use uuid::Uuid;

use fellowship_api::auth::jwt::JwtConfig;
use fellowship_api::config::ServerConfig;
use fellowship_api::routes;
use fellowship_api::state::AppState;
use fellowship_cache::{LocalStore, MemoryStore};
use fellowship_events::EventBus;
use fellowship_pipeline::IntakeConfig;
use fellowship_platform::claims::issue_token;
use fellowship_platform::{InMemoryPlatform, PlatformClient, PlatformConfig};

pub const TEST_SECRET: &str = "integration-test-secret-long-enough-for-hs256";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Build a test `ServerConfig` with safe defaults and no settle delay.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        platform: PlatformConfig {
            url: None,
            anon_key: String::new(),
            service_key: String::new(),
            storage_bucket: "applications".to_string(),
        },
        intake: IntakeConfig {
            settle_delay: Duration::ZERO,
            ..IntakeConfig::default()
        },
    }
}

/// Handles a test keeps next to the router.
pub struct TestApp {
    pub router: Router,
    pub platform: Arc<InMemoryPlatform>,
    pub state: AppState,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Register a platform user with a profile row and return a token.
    pub fn member(&self, email: &str, role: &str, onboarded: bool) -> (Uuid, String) {
        let user = self.platform.register_user(email, TEST_PASSWORD);
        self.platform.seed(
            "profiles",
            serde_json::json!({
                "id": user.id.to_string(),
                "email": user.email,
                "full_name": email.split('@').next().unwrap_or_default(),
                "role": role,
                "onboarding_completed": onboarded,
            }),
        );
        (user.id, token_for(user.id, email))
    }

    /// Register a platform user with no profile row.
    pub fn stranger(&self, email: &str) -> (Uuid, String) {
        let user = self.platform.register_user(email, TEST_PASSWORD);
        (user.id, token_for(user.id, email))
    }
}

pub fn token_for(user_id: Uuid, email: &str) -> String {
    issue_token(user_id, email, TEST_SECRET, 900).expect("token should be issued")
}

/// Build the full application router with all middleware layers on top of
/// an in-memory platform and cache.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

/// [`build_test_app`] with a caller-supplied configuration.
pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let platform = Arc::new(InMemoryPlatform::new(TEST_SECRET));
    let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
    let event_bus = Arc::new(EventBus::default());

    let state = AppState::new(
        config,
        Arc::clone(&platform) as Arc<dyn PlatformClient>,
        store,
        event_bus,
    );

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state.clone());

    TestApp {
        router,
        platform,
        state,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router should respond")
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, json_request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, None)).await
}

pub async fn post_empty_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::PATCH, uri, None, Some(body))).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PATCH, uri, Some(token), Some(body))).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, json_request(Method::DELETE, uri, None, None)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::DELETE, uri, Some(token), None)).await
}

/// POST a single-file multipart form under the `file` field.
pub async fn post_file(
    app: Router,
    uri: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Response<Body> {
    let boundary = "fellowship-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Application form helpers
// ---------------------------------------------------------------------------

pub async fn open_session(app: Router, variant: &str) -> String {
    let response = post_empty(app, &format!("/api/v1/intake?variant={variant}")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

pub fn complete_draft() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.org",
        "country": "United Kingdom",
        "nationality": "British",
        "education": {
            "education_background": "graduateSchool",
            "graduate_school": "University of London",
            "program": "Mathematics"
        },
        "graduation_year": "2027",
        "category": "Deep Tech",
        "project_description": "An analytical engine",
        "linkedin_url": "https://www.linkedin.com/in/ada",
        "video_url": "https://youtu.be/engine"
    })
}

/// Open a session, fill it, attach a resume and walk to the last step.
pub async fn ready_to_submit(test: &TestApp, variant: &str) -> String {
    let id = open_session(test.app(), variant).await;
    let response = patch_json(test.app(), &format!("/api/v1/intake/{id}"), complete_draft()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_file(
        test.app(),
        &format!("/api/v1/intake/{id}/attachments/resume"),
        "cv.pdf",
        "application/pdf",
        b"%PDF-1.7 resume",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..2 {
        let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/advance")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    id
}

/// Run a complete application through submission and return the platform
/// record id.
pub async fn submit_application(test: &TestApp, variant: &str) -> String {
    let id = ready_to_submit(test, variant).await;
    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["record_id"].as_str().unwrap().to_string()
}
