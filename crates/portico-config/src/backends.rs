// ============================================================================
// Backend Connection Configuration
// ============================================================================

const DEFAULT_GEO_ADDR: &str = "http://geo:50051";
const DEFAULT_AUTH_ADDR: &str = "http://auth:50051";
const DEFAULT_USER_ADDR: &str = "http://user:50051";

/// Addresses and connect policy for the three backend RPC services.
///
/// The connect policy only governs the blocking connect at startup; after
/// that the channel reconnects on its own.
#[derive(Clone, Debug)]
pub struct BackendsConfig {
    pub geo_addr: String,
    pub auth_addr: String,
    pub user_addr: String,

    /// First retry delay while waiting for the initial handshake.
    pub connect_initial_delay_ms: u64,
    /// Delay growth factor between retries.
    pub connect_backoff_multiplier: f64,
    /// Cap for the retry delay.
    pub connect_max_delay_ms: u64,
    /// Total budget for the initial connect; exhausting it is fatal.
    pub min_connect_timeout_secs: u64,
}

impl BackendsConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            geo_addr: std::env::var("GEO_SERVICE_ADDR")
                .unwrap_or_else(|_| DEFAULT_GEO_ADDR.to_string()),
            auth_addr: std::env::var("AUTH_SERVICE_ADDR")
                .unwrap_or_else(|_| DEFAULT_AUTH_ADDR.to_string()),
            user_addr: std::env::var("USER_SERVICE_ADDR")
                .unwrap_or_else(|_| DEFAULT_USER_ADDR.to_string()),

            connect_initial_delay_ms: std::env::var("BACKEND_CONNECT_INITIAL_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),

            connect_backoff_multiplier: std::env::var("BACKEND_CONNECT_BACKOFF_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.6),

            connect_max_delay_ms: std::env::var("BACKEND_CONNECT_MAX_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),

            min_connect_timeout_secs: std::env::var("BACKEND_MIN_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        }
    }
}
