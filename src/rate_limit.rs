//! Per-client rate limiting.
//!
//! Fixed-window counters keyed by client IP. The limiter owns its state and
//! takes the clock as a constructor argument so window expiry is testable
//! without sleeping.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use portico_config::LimitsConfig;
use portico_error::{GatewayError, GatewayResult};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Window {
    count: u32,
    started_at: Instant,
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: &LimitsConfig) -> Self {
        Self::with_clock(
            config.max_requests,
            Duration::from_secs(config.window_secs),
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request for the client. Increment and check happen under
    /// one lock acquisition, so concurrent requests cannot both slip under
    /// the limit.
    pub fn check(&self, client: IpAddr) -> GatewayResult<()> {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let window = windows.entry(client).or_insert(Window {
            count: 0,
            started_at: now,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.count = 0;
            window.started_at = now;
        }

        window.count += 1;
        if window.count > self.max_requests {
            return Err(GatewayError::TooManyRequests(
                "rate limit exceeded, try again later".to_string(),
            ));
        }
        Ok(())
    }
}
