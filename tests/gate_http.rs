mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header, request::Parts};
use axum::response::Response;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use gateway_auth::app;
use gateway_auth::services::auth::key_provider::PUBLIC_KEY_RESOURCE;
use gateway_auth::services::auth::resource::StaticResourceReader;
use gateway_auth::services::auth::{
    AccessDeniedHandler, DenyReason, JsonAccessDeniedHandler, KeyProvider, PermissionEvaluator,
    PolicyEvaluationError, Principal,
};

struct RecordingEvaluator {
    allow: bool,
    seen: Mutex<Vec<Principal>>,
}

#[async_trait]
impl PermissionEvaluator for RecordingEvaluator {
    async fn has_permission(
        &self,
        _request: &Parts,
        principal: &Principal,
    ) -> Result<bool, PolicyEvaluationError> {
        self.seen.lock().unwrap().push(principal.clone());
        Ok(self.allow)
    }
}

#[derive(Default)]
struct RecordingDenied {
    reasons: Mutex<Vec<(String, String)>>,
}

impl AccessDeniedHandler for RecordingDenied {
    fn handle(&self, request: &Parts, reason: &DenyReason) -> Response {
        self.reasons
            .lock()
            .unwrap()
            .push((request.uri.path().to_string(), reason.code().to_string()));
        JsonAccessDeniedHandler.handle(request, reason)
    }
}

struct Harness {
    router: Router,
    evaluator: Arc<RecordingEvaluator>,
    denied: Arc<RecordingDenied>,
}

impl Harness {
    async fn new(allow: bool) -> Self {
        let config = common::config(&[
            ("AUTH_URL_PERMIT_ALL", "/public/**,/health"),
            ("AUTH_JWT_ALGORITHM", "EdDSA"),
            ("ACCESS_TOKEN_LEEWAY_SECONDS", "0"),
        ]);
        let resources =
            StaticResourceReader::new().with(PUBLIC_KEY_RESOURCE, common::ED25519_PUBLIC_PEM);
        let key_provider = KeyProvider::new(Arc::new(resources), None);

        let evaluator = Arc::new(RecordingEvaluator {
            allow,
            seen: Mutex::new(Vec::new()),
        });
        let denied = Arc::new(RecordingDenied::default());

        let state = app::bootstrap(&config, &key_provider, evaluator.clone(), denied.clone())
            .await
            .expect("bootstrap");
        let router = app::build_router(state, &config);

        Self {
            router,
            evaluator,
            denied,
        }
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn evaluated(&self) -> Vec<Principal> {
        self.evaluator.seen.lock().unwrap().clone()
    }

    fn denials(&self) -> Vec<(String, String)> {
        self.denied.reasons.lock().unwrap().clone()
    }
}

fn valid_token() -> String {
    common::mint_ed25519(&json!({
        "sub": "alice",
        "client_id": "web",
        "scope": "orders:read",
        "authorities": ["ROLE_USER"],
        "exp": Utc::now().timestamp() + 600,
    }))
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn allow_listed_path_passes_without_token() {
    let harness = Harness::new(false).await;

    let response = harness.get("/public/health", None).await;

    // Past the gate; nothing is routed there.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(harness.evaluated().is_empty());
    assert!(harness.denials().is_empty());
}

#[tokio::test]
async fn dot_segments_under_public_prefix_require_a_token() {
    let harness = Harness::new(true).await;

    for uri in ["/public/../api/orders", "/public/%2e%2e/api/v1/me"] {
        let response = harness.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    assert!(harness.evaluated().is_empty());
    assert_eq!(harness.denials().len(), 2);
}

#[tokio::test]
async fn health_is_served_without_token() {
    let harness = Harness::new(false).await;

    let response = harness.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
    assert!(harness.evaluated().is_empty());
}

#[tokio::test]
async fn permitted_request_reaches_handler_with_principal() {
    let harness = Harness::new(true).await;

    let response = harness.get("/api/v1/me", Some(&valid_token())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subject"], "alice");
    assert_eq!(body["client_id"], "web");
    assert_eq!(body["authorities"], json!(["ROLE_USER"]));
    assert_eq!(body["scopes"], json!(["orders:read"]));

    let evaluated = harness.evaluated();
    assert_eq!(evaluated.len(), 1);
    assert_eq!(evaluated[0].subject, "alice");
}

#[tokio::test]
async fn permitted_request_to_orders_passes_the_gate() {
    let harness = Harness::new(true).await;

    let response = harness.get("/api/orders", Some(&valid_token())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(harness.evaluated().len(), 1);
    assert!(harness.denials().is_empty());
}

#[tokio::test]
async fn refused_request_is_forbidden() {
    let harness = Harness::new(false).await;

    let response = harness.get("/api/orders", Some(&valid_token())).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"]["code"], "forbidden");
    assert_eq!(harness.evaluated().len(), 1);
    assert_eq!(
        harness.denials(),
        vec![("/api/orders".to_string(), "forbidden".to_string())]
    );
}

#[tokio::test]
async fn expired_token_is_denied_before_policy() {
    let harness = Harness::new(true).await;
    let token = common::mint_ed25519(&json!({
        "sub": "alice",
        "exp": Utc::now().timestamp() - 3600,
    }));

    let response = harness.get("/api/orders", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        response.headers()[header::WWW_AUTHENTICATE]
            .to_str()
            .unwrap()
            .contains("invalid_token")
    );
    assert!(harness.evaluated().is_empty());
    assert_eq!(
        harness.denials(),
        vec![("/api/orders".to_string(), "token_expired".to_string())]
    );
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let harness = Harness::new(true).await;

    let response = harness.get("/api/orders", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "unauthenticated");
    assert!(harness.evaluated().is_empty());
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let harness = Harness::new(true).await;
    let token = valid_token();
    let (head, signature) = token.rsplit_once('.').unwrap();
    // Different, well-formed signature bytes.
    let forged = format!("{head}.{}", signature.chars().rev().collect::<String>());

    let response = harness.get("/api/orders", Some(&forged)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.evaluated().is_empty());
    assert_eq!(harness.denials().len(), 1);
}

#[tokio::test]
async fn denied_responses_carry_request_id() {
    let harness = Harness::new(true).await;

    let response = harness.get("/api/orders", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-request-id"));
}
