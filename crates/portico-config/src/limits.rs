// ============================================================================
// Rate Limiting Configuration
// ============================================================================

/// Per-client-IP rate limiting thresholds.
#[derive(Clone, Debug)]
pub struct LimitsConfig {
    /// Maximum requests per client within one window.
    pub max_requests: u32,
    /// Window length in seconds; the counter resets when it elapses.
    pub window_secs: u64,
}

impl LimitsConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),

            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}
