//! Upstream proxy client
//!
//! Performs one authenticated HTTP call to the operations-center REST API
//! per logical gateway operation. Every call carries the configured bearer
//! token; mutating calls additionally carry an `Idempotency-Key` header.
//! Cursors are opaque: the inbound cursor is forwarded verbatim as a query
//! parameter and the upstream's `nextCursor` is forwarded verbatim back.
//! The client never retries on its own initiative.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::idempotency::IdempotencyKey;
use crate::model::Page;
use crate::{Error, Result};

/// Header carrying the deduplication key for mutating calls
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Maximum upstream error body length surfaced to callers
const MAX_ERROR_BODY: usize = 500;

/// Authenticated client for the upstream REST API
pub struct UpstreamClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl UpstreamClient {
    /// Build a client from configuration. The per-call timeout is fixed at
    /// construction; on expiry a call fails with [`Error::UpstreamTimeout`].
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid upstream base URL: {e}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Read one page of a collection. `cursor`, when present, is forwarded
    /// verbatim as the `cursor` query parameter.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        cursor: Option<&str>,
    ) -> Result<Page<T>> {
        let mut request = self
            .http
            .get(self.endpoint(&[collection])?)
            .bearer_auth(&self.token);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        debug!(collection, cursor = cursor.unwrap_or(""), "Upstream list");
        let response = request.send().await.map_err(map_transport_error)?;
        decode(response, collection).await
    }

    /// Fetch a single entity by id. Upstream 404 becomes [`Error::NotFound`].
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: i64) -> Result<T> {
        let response = self
            .http
            .get(self.endpoint(&[collection, &id.to_string()])?)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode(response, &format!("{collection}/{id}")).await
    }

    /// Create an entity (mutating; carries the idempotency key).
    pub async fn create(
        &self,
        collection: &str,
        body: &Value,
        key: &IdempotencyKey,
    ) -> Result<Value> {
        debug!(collection, idempotency_key = %key, "Upstream create");
        let response = self
            .http
            .post(self.endpoint(&[collection])?)
            .bearer_auth(&self.token)
            .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode(response, collection).await
    }

    /// Update an entity (mutating; carries the idempotency key).
    pub async fn update(
        &self,
        collection: &str,
        id: i64,
        body: &Value,
        key: &IdempotencyKey,
    ) -> Result<Value> {
        debug!(collection, id, idempotency_key = %key, "Upstream update");
        let response = self
            .http
            .patch(self.endpoint(&[collection, &id.to_string()])?)
            .bearer_auth(&self.token)
            .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode(response, &format!("{collection}/{id}")).await
    }

    /// Delete an entity (mutating; carries the idempotency key).
    pub async fn delete(&self, collection: &str, id: i64, key: &IdempotencyKey) -> Result<()> {
        debug!(collection, id, idempotency_key = %key, "Upstream delete");
        let response = self
            .http
            .delete(self.endpoint(&[collection, &id.to_string()])?)
            .bearer_auth(&self.token)
            .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{collection}/{id} not found upstream")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status, body));
        }
        Ok(())
    }

    /// Resolve an endpoint under the configured base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config("upstream base URL cannot be a base".to_string()))?
            .extend(segments);
        Ok(url)
    }
}

/// Decode an upstream response, mapping 404 and non-2xx statuses.
async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(format!("{context} not found upstream")));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(upstream_error(status, body));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| Error::Internal(format!("invalid upstream response for {context}: {e}")))
}

fn upstream_error(status: StatusCode, body: String) -> Error {
    Error::Upstream {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

/// Distinguish "no answer" from transport failures so callers can retry
/// safely with the same idempotency key.
fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::UpstreamTimeout(e.to_string())
    } else {
        Error::Http(e)
    }
}
