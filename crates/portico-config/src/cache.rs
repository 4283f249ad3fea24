// ============================================================================
// Cache Store Configuration
// ============================================================================

const DEFAULT_CACHE_URL: &str = "redis://127.0.0.1:6379";

// Address lookups change rarely; user listings go stale in minutes.
const DEFAULT_GEO_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_USER_TTL_SECS: u64 = 5 * 60;

/// Cache store connection settings and per-method-family TTLs.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Store URL; credentials go in the URL (redis://:password@host:port).
    pub url: String,

    /// Global switch for the whole caching layer.
    pub enabled: bool,

    pub connect_timeout_secs: u64,
    pub response_timeout_secs: u64,
    pub max_retries: u64,

    /// TTL for cached address lookups.
    pub geo_ttl_secs: u64,
    /// TTL for cached user listings.
    pub user_ttl_secs: u64,
}

impl CacheConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            url: std::env::var("CACHE_URL").unwrap_or_else(|_| DEFAULT_CACHE_URL.to_string()),

            enabled: std::env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),

            connect_timeout_secs: std::env::var("CACHE_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            response_timeout_secs: std::env::var("CACHE_RESPONSE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),

            max_retries: std::env::var("CACHE_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),

            geo_ttl_secs: std::env::var("CACHE_GEO_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GEO_TTL_SECS),

            user_ttl_secs: std::env::var("CACHE_USER_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_USER_TTL_SECS),
        }
    }
}
