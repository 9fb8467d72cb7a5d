//! Error types for the operations-center gateway

use std::io;

use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or invalid bearer token (handled at the gate as HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown JSON-RPC method / tool / prompt name
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Argument object did not match the handler's expected shape
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Entity absent upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream answered with a non-2xx status
    #[error("Upstream error {status}: {body}")]
    Upstream {
        /// HTTP status returned by the upstream API
        status: u16,
        /// Response body (may be truncated)
        body: String,
    },

    /// Upstream did not answer within the configured timeout
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert to a stable JSON-RPC error code
    #[must_use]
    pub fn to_rpc_code(&self) -> i32 {
        match self {
            Self::MethodNotFound(_) => rpc_codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => rpc_codes::INVALID_PARAMS,
            Self::Json(_) => rpc_codes::PARSE_ERROR,
            Self::NotFound(_) => rpc_codes::NOT_FOUND,
            Self::Upstream { .. } | Self::Http(_) => rpc_codes::UPSTREAM_ERROR,
            Self::UpstreamTimeout(_) => rpc_codes::UPSTREAM_TIMEOUT,
            Self::Unauthorized(_) => rpc_codes::UNAUTHORIZED,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// JSON-RPC error codes used by the gateway
pub mod rpc_codes {
    /// Parse error - Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - Not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Missing or invalid bearer token
    pub const UNAUTHORIZED: i32 = -32000;
    /// Entity absent upstream
    pub const NOT_FOUND: i32 = -32001;
    /// Non-2xx from the upstream API
    pub const UPSTREAM_ERROR: i32 = -32002;
    /// Upstream gave no answer within the timeout
    pub const UPSTREAM_TIMEOUT: i32 = -32003;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_codes_are_stable() {
        assert_eq!(
            Error::MethodNotFound("x".into()).to_rpc_code(),
            rpc_codes::METHOD_NOT_FOUND
        );
        assert_eq!(
            Error::InvalidParams("x".into()).to_rpc_code(),
            rpc_codes::INVALID_PARAMS
        );
        assert_eq!(Error::NotFound("x".into()).to_rpc_code(), rpc_codes::NOT_FOUND);
        assert_eq!(
            Error::Upstream {
                status: 500,
                body: "boom".into()
            }
            .to_rpc_code(),
            rpc_codes::UPSTREAM_ERROR
        );
        assert_eq!(
            Error::UpstreamTimeout("x".into()).to_rpc_code(),
            rpc_codes::UPSTREAM_TIMEOUT
        );
        assert_eq!(
            Error::Internal("x".into()).to_rpc_code(),
            rpc_codes::INTERNAL_ERROR
        );
    }

    #[test]
    fn upstream_error_preserves_status_in_message() {
        let err = Error::Upstream {
            status: 503,
            body: "maintenance".into(),
        };
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("maintenance"));
    }
}
