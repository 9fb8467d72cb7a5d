//! Idempotency keys for mutating upstream calls
//!
//! A key is generated once per logical client operation (never per retry)
//! and attached verbatim to the upstream `Idempotency-Key` header, so the
//! upstream can deduplicate repeated deliveries. Callers may supply their
//! own key; otherwise the registry generates a collision-resistant one per
//! invocation. A failed call must never be retried under a fresh key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque idempotency key attached to every mutating upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wrap a caller-supplied key. The value is passed through unchanged.
    #[must_use]
    pub fn from_client(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a fresh collision-resistant key (random UUID v4).
    ///
    /// Two independent operations never collide; a single retried operation
    /// must reuse the key it was first assigned.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The key as the header value to send upstream.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn client_key_passes_through_unchanged() {
        let key = IdempotencyKey::from_client("order-2026-000381");
        assert_eq!(key.as_str(), "order-2026-000381");
        assert_eq!(key.to_string(), "order-2026-000381");
    }

    #[test]
    fn generated_keys_are_unique() {
        let keys: HashSet<String> = (0..1000)
            .map(|_| IdempotencyKey::generate().as_str().to_string())
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn generated_key_is_a_uuid() {
        let key = IdempotencyKey::generate();
        assert!(uuid::Uuid::parse_str(key.as_str()).is_ok());
    }

    #[test]
    fn serializes_as_bare_string() {
        let key = IdempotencyKey::from_client("k-1");
        assert_eq!(serde_json::to_value(&key).unwrap(), "k-1");
        let back: IdempotencyKey = serde_json::from_value("k-1".into()).unwrap();
        assert_eq!(back, key);
    }
}
