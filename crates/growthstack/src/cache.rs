//! Versioned result cache.
//!
//! Key schema: `audit:v5:{pillar}:{domain-slug}`, serialized `AuditResult`,
//! no TTL. Entries are created on first successful analysis and overwritten
//! unconditionally on recomputation. Migration policy: bumping the version
//! segment treats every older entry as absent; old entries are never read or
//! deleted.

use tracing::warn;

use crate::model::AuditResult;
use crate::pillar::Pillar;
use growthstack_common::store::KeyValueStore;

const KEY_PREFIX: &str = "audit:v5:";

pub struct AuditCache<S> {
    store: S,
}

impl<S: KeyValueStore> AuditCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the cached result for a (pillar, domain) pair. A corrupt
    /// entry logs a warning and reads as a miss; callers recompute.
    pub async fn get(&self, pillar: Pillar, domain: &str) -> Option<AuditResult> {
        let key = cache_key(pillar, domain);
        let json = self.store.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key = %key, "cache deserialization failed, recomputing"))
            .ok()
    }

    pub async fn set(&self, pillar: Pillar, domain: &str, result: &AuditResult) {
        let key = cache_key(pillar, domain);
        if let Ok(json) = serde_json::to_string(result) {
            self.store.set(&key, &json).await;
        }
    }
}

/// Derive the cache key. The domain is normalized by stripping every
/// character outside `[a-zA-Z0-9]`, so scheme, path, and punctuation
/// variants of the same domain share an entry.
pub fn cache_key(pillar: Pillar, domain: &str) -> String {
    let slug: String = domain.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("{KEY_PREFIX}{}:{}", pillar.cache_id(), slug)
}
