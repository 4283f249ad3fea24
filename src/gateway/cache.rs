//! Response caching policy.
//!
//! The store (see `portico-cache`) holds bytes; this layer decides what is
//! cacheable, derives keys, and owns the entry envelope. Anything wrong with
//! the store or a stored entry degrades to a miss.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use sha2::{Digest, Sha256};
use tracing::warn;

use portico_cache::{CacheEntry, CacheStore};

use crate::gateway::dispatch::Method;
use crate::metadata::{self, Metadata};

const KEY_PREFIX: &str = "gateway:";

pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    geo_ttl: Duration,
    user_ttl: Duration,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, geo_ttl: Duration, user_ttl: Duration) -> Self {
        Self {
            store,
            geo_ttl,
            user_ttl,
        }
    }

    /// Caching applies only when the store is up, the method is on the
    /// allow-list, and the request carries a resolved subject. The subject
    /// requirement keeps unauthenticated requests out of the cache entirely.
    pub fn should_check(&self, method: Method, metadata: &Metadata) -> bool {
        self.store.is_enabled()
            && method.cacheable()
            && metadata.get(metadata::SUBJECT_ID).is_some()
    }

    /// Derives the cache key from everything that shapes the response.
    ///
    /// Fields are length-prefixed before hashing so no two field sequences
    /// can collide by concatenation.
    pub fn key(method: Method, body: &[u8], metadata: &Metadata) -> String {
        let mut hasher = Sha256::new();
        let fields: [&[u8]; 6] = [
            method.service().as_str().as_bytes(),
            method.path().as_bytes(),
            body,
            metadata.get(metadata::SUBJECT_ID).unwrap_or("").as_bytes(),
            metadata.get(metadata::LIMIT).unwrap_or("").as_bytes(),
            metadata.get(metadata::OFFSET).unwrap_or("").as_bytes(),
        ];
        for field in fields {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field);
        }
        format!("{KEY_PREFIX}{}", hex::encode(hasher.finalize()))
    }

    /// A hit reproduces the original response body and status. A corrupt
    /// entry is a miss.
    pub async fn get(&self, key: &str) -> Option<(Vec<u8>, StatusCode)> {
        let bytes = self.store.get(key).await?;
        let entry = match CacheEntry::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt cache entry");
                return None;
            }
        };
        let status = StatusCode::from_u16(entry.status).ok()?;
        let body = serde_json::to_vec(&entry.data).ok()?;
        Some((body, status))
    }

    pub async fn put(&self, key: &str, method: Method, body: &[u8], status: StatusCode) {
        let data = match serde_json::from_slice(body) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "Skipping cache write for non-JSON body");
                return;
            }
        };
        let entry = CacheEntry::new(data, status.as_u16());
        match entry.to_bytes() {
            Ok(bytes) => self.store.put(key, &bytes, self.ttl_for(method)).await,
            Err(e) => warn!(key, error = %e, "Cache entry encoding failed"),
        }
    }

    fn ttl_for(&self, method: Method) -> Duration {
        match method {
            Method::GeoAddressSearch | Method::GeoGeocode => self.geo_ttl,
            _ => self.user_ttl,
        }
    }
}
