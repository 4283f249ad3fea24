use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use portico_backend::{
    AuthClient, ConnectPolicy, GeoClient, ServiceName, UserClient, connect,
};
use portico_cache::{CacheStore, DisabledStore, RedisSettings, RedisStore};
use portico_config::GatewayConfig;

use portico_gateway::gateway::Gateway;
use portico_gateway::gateway::cache::CacheManager;
use portico_gateway::gateway::dispatch::Backends;
use portico_gateway::rate_limit::RateLimiter;
use portico_gateway::routes::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.rust_log))
        .init();

    info!("Starting Portico gateway");

    let policy = ConnectPolicy {
        initial_delay: Duration::from_millis(config.backends.connect_initial_delay_ms),
        multiplier: config.backends.connect_backoff_multiplier,
        max_delay: Duration::from_millis(config.backends.connect_max_delay_ms),
        min_connect_timeout: Duration::from_secs(config.backends.min_connect_timeout_secs),
    };

    // All three backends must be reachable before we accept traffic.
    let auth_channel = connect(ServiceName::Auth, &config.backends.auth_addr, &policy)
        .await
        .context("Failed to connect to auth service")?;
    let geo_channel = connect(ServiceName::Geo, &config.backends.geo_addr, &policy)
        .await
        .context("Failed to connect to geo service")?;
    let user_channel = connect(ServiceName::User, &config.backends.user_addr, &policy)
        .await
        .context("Failed to connect to user service")?;

    let backends = Backends {
        auth: Arc::new(AuthClient::new(auth_channel)),
        geo: Arc::new(GeoClient::new(geo_channel)),
        user: Arc::new(UserClient::new(user_channel)),
    };

    let store: Arc<dyn CacheStore> = if config.cache.enabled {
        let settings = RedisSettings {
            url: config.cache.url.clone(),
            connect_timeout: Duration::from_secs(config.cache.connect_timeout_secs),
            response_timeout: Duration::from_secs(config.cache.response_timeout_secs),
            max_retries: config.cache.max_retries as usize,
        };
        match RedisStore::connect(&settings).await {
            Some(store) => Arc::new(store),
            None => {
                warn!("Running without response caching");
                Arc::new(DisabledStore)
            }
        }
    } else {
        info!("Response caching disabled by configuration");
        Arc::new(DisabledStore)
    };

    let cache = CacheManager::new(
        store,
        Duration::from_secs(config.cache.geo_ttl_secs),
        Duration::from_secs(config.cache.user_ttl_secs),
    );

    let gateway = Arc::new(Gateway::new(
        backends,
        cache,
        Duration::from_secs(config.request_timeout_secs),
    ));
    let limiter = Arc::new(RateLimiter::new(&config.limits));

    let app = routes::app(AppState { gateway, limiter });

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install shutdown handler");
        return;
    }
    info!("Shutdown signal received");
}
