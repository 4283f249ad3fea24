//! # Portico Cache
//!
//! Storage layer for the gateway response cache.
//!
//! The gateway treats the cache as strictly optional: when redis is missing
//! or misbehaving, requests flow straight through to the backends. That rule
//! lives here as the degrade path of [`RedisStore::connect`] and the
//! swallow-and-log behavior of its get/put operations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Cache Entry Envelope
// ============================================================================

/// The value stored under each cache key.
///
/// Carries the response body together with the HTTP status it was served
/// with, so a hit reproduces the original response exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub status: u16,
    /// Unix timestamp of when the entry was written.
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(data: serde_json::Value, status: u16) -> Self {
        Self {
            data,
            status,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Byte-level cache storage.
///
/// Implementations never surface errors to the caller. A failed read is a
/// miss, a failed write is dropped, both are logged here.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    async fn put(&self, key: &str, value: &[u8], ttl: Duration);
}

// ============================================================================
// Redis Store
// ============================================================================

/// Connection settings for [`RedisStore::connect`].
#[derive(Clone, Debug)]
pub struct RedisSettings {
    pub url: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub max_retries: usize,
}

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connects to redis, returning None when the server is unreachable.
    ///
    /// The caller substitutes [`DisabledStore`] on None so the gateway
    /// starts without a cache rather than refusing to start.
    pub async fn connect(settings: &RedisSettings) -> Option<Self> {
        let client = match redis::Client::open(settings.url.as_str()) {
            Ok(client) => client,
            Err(e) => {
                warn!(url = %settings.url, error = %e, "Invalid cache URL, caching disabled");
                return None;
            }
        };

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(settings.connect_timeout)
            .set_response_timeout(settings.response_timeout)
            .set_number_of_retries(settings.max_retries);

        match ConnectionManager::new_with_config(client, config).await {
            Ok(manager) => {
                info!(url = %settings.url, "Connected to cache");
                Some(Self { manager })
            }
            Err(e) => {
                warn!(url = %settings.url, error = %e, "Cache unreachable, caching disabled");
                None
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) {
        let mut conn = self.manager.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
        {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

// ============================================================================
// Disabled Store
// ============================================================================

/// Stand-in used when caching is turned off or redis is unreachable.
#[derive(Default)]
pub struct DisabledStore;

#[async_trait]
impl CacheStore for DisabledStore {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn put(&self, _key: &str, _value: &[u8], _ttl: Duration) {}
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-process store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().unwrap();
        let (value, expires_at) = entries.get(key)?;
        if Instant::now() >= *expires_at {
            return None;
        }
        Some(value.clone())
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
    }
}
