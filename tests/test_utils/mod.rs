#![allow(dead_code)]

//! Shared harness for the integration tests: spawns the real axum app on an
//! ephemeral port with mock backends and drives it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portico_backend::mock::{MockAuthBackend, MockGeoBackend, MockUserBackend};
use portico_cache::{CacheStore, MemoryStore};
use portico_gateway::gateway::Gateway;
use portico_gateway::gateway::cache::CacheManager;
use portico_gateway::gateway::dispatch::Backends;
use portico_gateway::rate_limit::{RateLimiter, SystemClock};
use portico_gateway::routes::{self, AppState};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub auth: Arc<MockAuthBackend>,
    pub geo: Arc<MockGeoBackend>,
    pub user: Arc<MockUserBackend>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user and logs in, returning a bearer token the auth mock
    /// will accept.
    pub async fn register_and_login(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({"email": email, "password": "secret123"}))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(response.status().as_u16(), 201);

        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({"email": email, "password": "secret123"}))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.expect("login body is json");
        body["token"].as_str().expect("token present").to_string()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_configured(Arc::new(MemoryStore::new()), 10_000).await
}

pub async fn spawn_app_configured(store: Arc<dyn CacheStore>, max_requests: u32) -> TestApp {
    let auth = Arc::new(MockAuthBackend::new());
    let geo = Arc::new(MockGeoBackend::new());
    let user = Arc::new(MockUserBackend::new());

    let backends = Backends {
        auth: auth.clone(),
        geo: geo.clone(),
        user: user.clone(),
    };
    let cache = CacheManager::new(store, Duration::from_secs(60), Duration::from_secs(60));
    let gateway = Arc::new(Gateway::new(backends, cache, Duration::from_secs(5)));
    let limiter = Arc::new(RateLimiter::with_clock(
        max_requests,
        Duration::from_secs(60),
        Arc::new(SystemClock),
    ));

    let app = routes::app(AppState { gateway, limiter });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server failed");
    });

    TestApp {
        address: format!("http://{addr}"),
        client: reqwest::Client::new(),
        auth,
        geo,
        user,
    }
}

/// A store that claims to be up but fails every operation, for exercising
/// the degrade-to-miss path end to end.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn put(&self, _key: &str, _value: &[u8], _ttl: Duration) {}
}
