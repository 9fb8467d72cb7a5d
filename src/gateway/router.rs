//! HTTP routes and middleware stack

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::config::Config;
use crate::error::rpc_codes;
use crate::gateway::auth::{ResolvedAuthConfig, auth_middleware};
use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::registry::Registry;
use crate::{Error, Result};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Capability registry handling JSON-RPC dispatch
    pub registry: Arc<Registry>,
    /// Resolved authentication settings
    pub auth: Arc<ResolvedAuthConfig>,
    /// Base URL advertised by the discovery endpoint
    pub advertised_url: String,
}

/// Build the router with the full middleware stack. The authentication
/// gate is the innermost layer; CORS wraps it so rejected preflight and
/// 401 responses still carry CORS headers.
pub fn create_router(state: AppState, config: &Config) -> Result<Router> {
    let cors = cors_layer(config)?;

    let router = Router::new()
        .route("/", get(liveness))
        .route("/api/discovery", get(discovery))
        .route("/api/mcp-status", get(mcp_status))
        .route("/mcp", post(handle_rpc))
        .route("/mcp/{*path}", post(handle_rpc))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    match &config.cors.allowed_origin {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .map_err(|_| Error::Config(format!("invalid CORS origin: {origin}")))?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}

async fn liveness() -> &'static str {
    "opscenter-gateway: ok"
}

/// Connection metadata for clients that have not authenticated yet.
async fn discovery(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "server_url": state.advertised_url,
        "mcp_endpoint": format!("{}/mcp", state.advertised_url),
        "auth_required": true,
        "auth_type": "bearer",
        "server_info": state.registry.server_info(),
    }))
}

/// Capability counts for monitoring.
async fn mcp_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "mcp_server_name": state.registry.server_info().name,
        "resources_count": state.registry.resources().len(),
        "tools_count": state.registry.tools().len(),
        "prompts_count": state.registry.prompts().len(),
        "status": "running",
    }))
}

/// JSON-RPC entry point. Requests get a response envelope; notifications
/// are acknowledged with 202 and no body. Payloads that are not JSON get a
/// parse-error envelope (-32700) with a null id; JSON that is not a valid
/// request object gets an invalid-request envelope (-32600), echoing the
/// payload's id when one is present.
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) else {
        warn!("Rejecting unparseable JSON-RPC payload");
        return Json(JsonRpcResponse::error(
            None,
            rpc_codes::PARSE_ERROR,
            "invalid JSON-RPC payload".to_string(),
        ))
        .into_response();
    };

    match serde_json::from_value::<JsonRpcRequest>(value.clone()) {
        Ok(request) => Json(state.registry.dispatch(request).await).into_response(),
        Err(_) => {
            if serde_json::from_value::<JsonRpcNotification>(value.clone()).is_ok() {
                return StatusCode::ACCEPTED.into_response();
            }
            let id = value
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value(id).ok());
            warn!("Rejecting malformed JSON-RPC request object");
            Json(JsonRpcResponse::error(
                id,
                rpc_codes::INVALID_REQUEST,
                "not a valid JSON-RPC request object".to_string(),
            ))
            .into_response()
        }
    }
}
