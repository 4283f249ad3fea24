// ============================================================================
// Portico Config - Centralized configuration management
// ============================================================================
//
// This crate provides configuration for the gateway process. Everything is
// loaded from environment variables with sensible defaults; only values with
// no safe default are required.
//
// ============================================================================

mod backends;
mod cache;
mod limits;

pub use backends::BackendsConfig;
pub use cache::CacheConfig;
pub use limits::LimitsConfig;

use anyhow::Result;

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Main configuration structure for the gateway.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Port the HTTP server binds to.
    pub http_port: u16,

    /// Deadline for the whole cache-check/auth/dispatch span of one request.
    pub request_timeout_secs: u64,

    pub rust_log: String,

    // Sub-configurations
    pub backends: BackendsConfig,
    pub cache: CacheConfig,
    pub limits: LimitsConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_HTTP_PORT),

            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),

            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),

            backends: BackendsConfig::from_env(),
            cache: CacheConfig::from_env(),
            limits: LimitsConfig::from_env(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }
}
