//! Bearer-token authentication gate
//!
//! Every endpoint outside the public allow-list requires
//! `Authorization: Bearer <token>`. The gate runs before any routing or
//! upstream work; a failed check produces a 401 and nothing else happens.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::Error;

/// Authentication settings resolved at startup
#[derive(Debug, Clone)]
pub struct ResolvedAuthConfig {
    /// Shared bearer secret
    pub bearer_token: String,
    /// Paths that bypass the gate
    pub public_paths: Vec<String>,
}

impl ResolvedAuthConfig {
    /// Whether `path` is exempt from authentication. The root path matches
    /// exactly so it does not shadow every other route; the remaining
    /// entries match by prefix.
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths
            .iter()
            .any(|p| path == p || (p != "/" && path.starts_with(p.as_str())))
    }

    /// Validate a presented token against the configured secret in
    /// constant time.
    #[must_use]
    pub fn token_matches(&self, presented: &str) -> bool {
        presented
            .as_bytes()
            .ct_eq(self.bearer_token.as_bytes())
            .into()
    }
}

/// Marker extension proving a request passed the gate.
#[derive(Debug, Clone)]
pub struct AuthContext;

/// Axum middleware enforcing the bearer gate.
pub async fn auth_middleware(
    State(auth): State<Arc<ResolvedAuthConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if auth.is_public_path(&path) {
        return next.run(request).await;
    }

    if let Err(err) = check_credentials(&auth, &request) {
        debug!(path, error = %err, "Rejecting request at the gate");
        return unauthorized_response(&err);
    }

    request.extensions_mut().insert(AuthContext);
    next.run(request).await
}

/// Validate the request's credentials against the configured secret.
fn check_credentials(
    auth: &ResolvedAuthConfig,
    request: &Request,
) -> std::result::Result<(), Error> {
    let Some(token) = extract_bearer(request) else {
        return Err(Error::Unauthorized(
            "missing or invalid Authorization header".to_string(),
        ));
    };
    if !auth.token_matches(token) {
        return Err(Error::Unauthorized("invalid bearer token".to_string()));
    }
    Ok(())
}

fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The 401 body carries the rejection reason without the variant prefix;
/// clients see `{"error": "<reason>"}`.
fn unauthorized_response(err: &Error) -> Response {
    let message = match err {
        Error::Unauthorized(reason) => reason.clone(),
        other => other.to_string(),
    };
    (StatusCode::UNAUTHORIZED, Json(json!({"error": message}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> ResolvedAuthConfig {
        ResolvedAuthConfig {
            bearer_token: "secret-token".to_string(),
            public_paths: vec![
                "/".to_string(),
                "/api/discovery".to_string(),
                "/api/mcp-status".to_string(),
            ],
        }
    }

    #[test]
    fn root_is_public_but_does_not_shadow_other_paths() {
        let auth = auth();
        assert!(auth.is_public_path("/"));
        assert!(!auth.is_public_path("/mcp"));
        assert!(!auth.is_public_path("/anything"));
    }

    #[test]
    fn listed_prefixes_are_public() {
        let auth = auth();
        assert!(auth.is_public_path("/api/discovery"));
        assert!(auth.is_public_path("/api/mcp-status"));
        assert!(!auth.is_public_path("/api/other"));
    }

    fn get(path: &str, auth_header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method("GET").uri(path);
        if let Some(value) = auth_header {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[test]
    fn rejections_are_unauthorized_errors() {
        let auth = auth();

        let err = check_credentials(&auth, &get("/mcp", None)).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)), "got {err:?}");
        assert_eq!(err.to_rpc_code(), crate::error::rpc_codes::UNAUTHORIZED);

        let err = check_credentials(&auth, &get("/mcp", Some("Bearer wrong"))).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)), "got {err:?}");

        check_credentials(&auth, &get("/mcp", Some("Bearer secret-token"))).unwrap();
    }

    #[tokio::test]
    async fn rejection_body_carries_the_bare_reason() {
        let err = Error::Unauthorized("invalid bearer token".to_string());
        let response = unauthorized_response(&err);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid bearer token");
    }

    #[test]
    fn token_comparison_is_exact() {
        let auth = auth();
        assert!(auth.token_matches("secret-token"));
        assert!(!auth.token_matches("secret-toke"));
        assert!(!auth.token_matches("secret-token "));
        assert!(!auth.token_matches(""));
    }
}
