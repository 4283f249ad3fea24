use std::time::Duration;

use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tracing::{info, warn};

use crate::ServiceName;

// ============================================================================
// Startup Connection
// ============================================================================

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid {service} backend address '{addr}': {source}")]
    Address {
        service: ServiceName,
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("{service} backend unreachable at {addr} after {elapsed:?}: {source}")]
    Timeout {
        service: ServiceName,
        addr: String,
        elapsed: Duration,
        #[source]
        source: tonic::transport::Error,
    },
}

/// Backoff schedule for the startup connection loop.
#[derive(Clone, Debug)]
pub struct ConnectPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Total time to keep retrying before giving up.
    pub min_connect_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            multiplier: 1.6,
            max_delay: Duration::from_secs(5),
            min_connect_timeout: Duration::from_secs(20),
        }
    }
}

/// Establishes a channel to one backend, retrying with exponential backoff
/// until the policy deadline passes.
///
/// Called once per service at startup; a failure here is fatal for the
/// gateway process, which refuses to serve traffic without all backends.
pub async fn connect(
    service: ServiceName,
    addr: &str,
    policy: &ConnectPolicy,
) -> Result<Channel, ConnectError> {
    let endpoint = Endpoint::from_shared(addr.to_string())
        .map_err(|source| ConnectError::Address {
            service,
            addr: addr.to_string(),
            source,
        })?
        .connect_timeout(policy.max_delay)
        .tcp_nodelay(true);

    let started = tokio::time::Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt = 1u32;

    loop {
        match endpoint.connect().await {
            Ok(channel) => {
                info!(service = %service, addr, attempt, "Connected to backend");
                return Ok(channel);
            }
            Err(source) => {
                let elapsed = started.elapsed();
                if elapsed >= policy.min_connect_timeout {
                    return Err(ConnectError::Timeout {
                        service,
                        addr: addr.to_string(),
                        elapsed,
                        source,
                    });
                }
                warn!(
                    service = %service,
                    addr,
                    attempt,
                    error = %source,
                    retry_in_ms = delay.as_millis() as u64,
                    "Backend not ready, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * policy.multiplier)
                        .min(policy.max_delay.as_secs_f64()),
                );
                attempt += 1;
            }
        }
    }
}
