//! Authentication gate integration tests
//!
//! Exercises the full router through `tower::ServiceExt::oneshot`: the gate
//! must reject every protected request before any handler runs, and the
//! rejections must still carry CORS headers so browser clients can read them.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use opscenter_gateway::config::Config;
use opscenter_gateway::gateway::auth::ResolvedAuthConfig;
use opscenter_gateway::gateway::{AppState, create_router};
use opscenter_gateway::registry::Registry;
use opscenter_gateway::upstream::UpstreamClient;

const TOKEN: &str = "test-secret";

fn test_router() -> Router {
    let mut config = Config::default();
    config.auth.bearer_token = TOKEN.to_string();

    let upstream = Arc::new(UpstreamClient::new(&config.upstream).unwrap());
    let state = AppState {
        registry: Arc::new(Registry::new(upstream)),
        auth: Arc::new(ResolvedAuthConfig {
            bearer_token: config.auth.bearer_token.clone(),
            public_paths: config.auth.public_paths.clone(),
        }),
        advertised_url: "http://localhost:8000".to_string(),
    };
    create_router(state, &config).unwrap()
}

fn rpc_request(auth_header: Option<&str>) -> Request<Body> {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "http://example.com");
    if let Some(value) = auth_header {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let response = test_router().oneshot(rpc_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing or invalid Authorization header");
}

#[tokio::test]
async fn malformed_authorization_header_is_rejected() {
    let response = test_router()
        .oneshot(rpc_request(Some("Basic dXNlcjpwYXNz")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing or invalid Authorization header");
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let response = test_router()
        .oneshot(rpc_request(Some("Bearer not-the-secret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid bearer token");
}

#[tokio::test]
async fn rejections_carry_cors_headers() {
    let response = test_router().oneshot(rpc_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[tokio::test]
async fn valid_token_reaches_the_handler() {
    let response = test_router()
        .oneshot(rpc_request(Some(&format!("Bearer {TOKEN}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["jsonrpc"], "2.0");
    assert!(body["result"]["tools"].is_array());
}

#[tokio::test]
async fn public_endpoints_need_no_token() {
    for path in ["/", "/api/discovery", "/api/mcp-status"] {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "path {path}");
    }
}

#[tokio::test]
async fn root_allow_list_entry_does_not_shadow_protected_paths() {
    // "/" is public but "/mcp" must still be gated.
    let response = test_router().oneshot(rpc_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn discovery_advertises_bearer_auth() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/discovery")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["auth_required"], true);
    assert_eq!(body["auth_type"], "bearer");
    assert_eq!(body["mcp_endpoint"], "http://localhost:8000/mcp");
}
