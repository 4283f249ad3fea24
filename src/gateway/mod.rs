//! Request forwarding pipeline.
//!
//! Every API request passes through [`Gateway::forward`]: resolve the target
//! method, prepare outgoing metadata (delegating token validation for
//! non-auth services), consult the cache, enforce the auth outcome, dispatch
//! to the backend, and write successful responses back to the cache. The
//! whole span runs under one deadline.

pub mod auth;
pub mod cache;
pub mod dispatch;

use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use tracing::debug;

use portico_backend::ServiceName;
use portico_error::{GatewayError, GatewayResult};

use crate::gateway::auth::{AuthContext, AuthDelegate};
use crate::gateway::cache::CacheManager;
use crate::gateway::dispatch::{Backends, Method};
use crate::metadata::{self, Metadata};
use crate::metrics;

/// One inbound request, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Logical method path, e.g. `/api/address/search`.
    pub path: String,
    pub body: Bytes,
    /// Forwardable caller headers plus handler-injected fields.
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub body: Vec<u8>,
    pub status: StatusCode,
}

pub struct Gateway {
    backends: Backends,
    auth: AuthDelegate,
    cache: CacheManager,
    request_timeout: Duration,
}

impl Gateway {
    pub fn new(backends: Backends, cache: CacheManager, request_timeout: Duration) -> Self {
        let auth = AuthDelegate::new(backends.auth.clone());
        Self {
            backends,
            auth,
            cache,
            request_timeout,
        }
    }

    /// Runs the forwarding pipeline under the per-request deadline.
    pub async fn forward(&self, envelope: RequestEnvelope) -> GatewayResult<GatewayResponse> {
        match tokio::time::timeout(self.request_timeout, self.forward_inner(envelope)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::unavailable("request deadline exceeded")),
        }
    }

    async fn forward_inner(&self, envelope: RequestEnvelope) -> GatewayResult<GatewayResponse> {
        let method = Method::resolve(&envelope.path)?;
        let mut metadata = envelope.metadata.clone();

        // Subject resolution happens up front because the cache key depends
        // on it; the outcome is enforced only after the cache check so a hit
        // needs no second trip to the auth backend.
        let auth_outcome = self.prepare_metadata(method, &mut metadata).await;

        let cache_key = if self.cache.should_check(method, &metadata) {
            let key = CacheManager::key(method, &envelope.body, &metadata);
            if let Some((body, status)) = self.cache.get(&key).await {
                debug!(path = %envelope.path, "Cache hit");
                metrics::record_cache(true);
                return Ok(GatewayResponse { body, status });
            }
            metrics::record_cache(false);
            Some(key)
        } else {
            None
        };

        if method.service() != ServiceName::Auth {
            match auth_outcome {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(GatewayError::unauthenticated("missing authorization token"));
                }
            }
        }

        let (body, status) = self
            .backends
            .dispatch(method, &envelope.body, &metadata)
            .await?;

        if let Some(key) = cache_key {
            self.cache.put(&key, method, &body, status).await;
        }

        Ok(GatewayResponse { body, status })
    }

    /// Resolves the caller's token for non-auth targets and merges the
    /// gateway-injected fields over the caller's. Returns None when no
    /// authorization header was sent at all.
    async fn prepare_metadata(
        &self,
        method: Method,
        metadata: &mut Metadata,
    ) -> Option<GatewayResult<AuthContext>> {
        if method.service() == ServiceName::Auth {
            return None;
        }

        let raw = metadata.get(metadata::AUTHORIZATION)?.to_string();
        let outcome = self.auth.resolve(&raw).await;

        if let Ok(ctx) = &outcome {
            let mut injected = Metadata::new();
            injected.set(metadata::SUBJECT_ID, &ctx.subject_id);
            injected.set(metadata::AUTHORIZATION, &format!("Bearer {}", ctx.token));
            metadata.merge(&injected);
        }

        Some(outcome)
    }

    /// Liveness probe for one backend, used by the health endpoint.
    pub async fn ping(&self, service: ServiceName) -> Result<(), tonic::Status> {
        self.backends.ping(service).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_backend::mock::{MockAuthBackend, MockGeoBackend, MockUserBackend};
    use portico_cache::{CacheStore, MemoryStore};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    struct Harness {
        gateway: Gateway,
        auth: Arc<MockAuthBackend>,
        geo: Arc<MockGeoBackend>,
        user: Arc<MockUserBackend>,
        store: Arc<MemoryStore>,
    }

    fn harness() -> Harness {
        harness_with_store(Arc::new(MemoryStore::new()))
    }

    fn harness_with_store(store: Arc<MemoryStore>) -> Harness {
        let auth = Arc::new(MockAuthBackend::new());
        let geo = Arc::new(MockGeoBackend::new());
        let user = Arc::new(MockUserBackend::new());
        let backends = Backends {
            auth: auth.clone(),
            geo: geo.clone(),
            user: user.clone(),
        };
        let cache = CacheManager::new(
            store.clone() as Arc<dyn CacheStore>,
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        Harness {
            gateway: Gateway::new(backends, cache, Duration::from_secs(5)),
            auth,
            geo,
            user,
            store,
        }
    }

    fn search_envelope(token: Option<&str>) -> RequestEnvelope {
        let mut metadata = Metadata::new();
        if let Some(token) = token {
            metadata.set(metadata::AUTHORIZATION, &format!("Bearer {token}"));
        }
        RequestEnvelope {
            path: "/api/address/search".to_string(),
            body: Bytes::from_static(br#"{"query":"Moscow"}"#),
            metadata,
        }
    }

    #[tokio::test]
    async fn repeated_search_hits_the_cache() {
        let h = harness();
        h.auth.issue_token("tok", "user-1");

        let first = h.gateway.forward(search_envelope(Some("tok"))).await.unwrap();
        let second = h.gateway.forward(search_envelope(Some("tok"))).await.unwrap();

        assert_eq!(h.geo.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.status, second.status);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&first.body).unwrap(),
            serde_json::from_slice::<serde_json::Value>(&second.body).unwrap(),
        );
    }

    #[tokio::test]
    async fn subjects_do_not_share_cache_entries() {
        let h = harness();
        h.auth.issue_token("tok-a", "user-a");
        h.auth.issue_token("tok-b", "user-b");

        h.gateway.forward(search_envelope(Some("tok-a"))).await.unwrap();
        h.gateway.forward(search_envelope(Some("tok-b"))).await.unwrap();

        assert_eq!(h.geo.search_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.store.len(), 2);
    }

    #[tokio::test]
    async fn missing_token_never_reaches_dispatch() {
        let h = harness();
        let err = h.gateway.forward(search_envelope(None)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.geo.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_never_reaches_dispatch() {
        let h = harness();
        let err = h
            .gateway
            .forward(search_envelope(Some("bogus")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.geo.search_calls.load(Ordering::SeqCst), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn auth_requests_skip_delegation() {
        let h = harness();
        let envelope = RequestEnvelope {
            path: "/api/auth/register".to_string(),
            body: Bytes::from_static(br#"{"email":"a@b.com","password":"secret123"}"#),
            metadata: Metadata::new(),
        };
        let response = h.gateway.forward(envelope).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(h.auth.validate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subject_id_is_injected_not_trusted() {
        let h = harness();
        h.auth.issue_token("tok", "real-user");

        let mut envelope = search_envelope(Some("tok"));
        envelope.metadata.append(metadata::SUBJECT_ID, "spoofed");
        h.gateway.forward(envelope).await.unwrap();

        assert_eq!(
            h.geo.last_subject.lock().unwrap().as_deref(),
            Some("real-user")
        );
    }

    #[tokio::test]
    async fn profile_targets_the_authenticated_subject() {
        let h = harness();
        h.auth.issue_token("tok", "user-9");

        let mut metadata = Metadata::new();
        metadata.set(metadata::AUTHORIZATION, "Bearer tok");
        let envelope = RequestEnvelope {
            path: "/api/user/profile".to_string(),
            body: Bytes::new(),
            metadata,
        };
        h.gateway.forward(envelope).await.unwrap();

        let seen = h.user.last_profile_request.lock().unwrap().clone().unwrap();
        assert_eq!(seen.user_id, "user-9");
    }

    #[tokio::test]
    async fn auth_errors_are_not_cached() {
        let h = harness();
        h.gateway.forward(search_envelope(Some("bogus"))).await.unwrap_err();
        assert!(h.store.is_empty());
    }
}
