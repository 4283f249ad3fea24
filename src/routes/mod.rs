//! HTTP surface.
//!
//! Thin axum layer: every API handler collects the forwardable headers and
//! hands a [`RequestEnvelope`] to the gateway pipeline. Routing logic lives
//! in the pipeline, not here.

pub mod middleware;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use http::{HeaderMap, StatusCode, header};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use portico_backend::ServiceName;
use portico_error::GatewayError;

use crate::gateway::dispatch::Method;
use crate::gateway::{Gateway, RequestEnvelope};
use crate::metadata::{self, Metadata};
use crate::metrics;
use crate::rate_limit::RateLimiter;

/// Budget for each backend ping on the health endpoint.
const HEALTH_PING_BUDGET: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub limiter: Arc<RateLimiter>,
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route(Method::AuthRegister.path(), post(auth_register))
        .route(Method::AuthLogin.path(), post(auth_login))
        .route(Method::GeoAddressSearch.path(), post(address_search))
        .route(Method::GeoGeocode.path(), post(address_geocode))
        .route(Method::UserProfile.path(), get(user_profile))
        .route(Method::UserList.path(), get(user_list))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_id))
                .layer(axum::middleware::from_fn(middleware::record_metrics))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::rate_limiting,
                )),
        );

    // Health and metrics sit outside the API middleware stack so probes are
    // never rate limited.
    Router::new()
        .merge(api)
        .route("/health", get(health))
        .route("/metrics", get(serve_metrics))
        .with_state(state)
}

// ============================================================================
// API Handlers
// ============================================================================

async fn auth_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, Method::AuthRegister, &headers, body, Metadata::new()).await
}

async fn auth_login(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    forward(&state, Method::AuthLogin, &headers, body, Metadata::new()).await
}

async fn address_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::GeoAddressSearch,
        &headers,
        body,
        Metadata::new(),
    )
    .await
}

async fn address_geocode(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, Method::GeoGeocode, &headers, body, Metadata::new()).await
}

async fn user_profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    forward(
        &state,
        Method::UserProfile,
        &headers,
        Bytes::new(),
        Metadata::new(),
    )
    .await
}

#[derive(Debug, Deserialize)]
struct Pagination {
    limit: Option<String>,
    offset: Option<String>,
}

async fn user_list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
    headers: HeaderMap,
) -> Response {
    let mut extra = Metadata::new();
    if let Some(limit) = &page.limit {
        extra.set(metadata::LIMIT, limit);
    }
    if let Some(offset) = &page.offset {
        extra.set(metadata::OFFSET, offset);
    }
    forward(&state, Method::UserList, &headers, Bytes::new(), extra).await
}

async fn forward(
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    body: Bytes,
    extra: Metadata,
) -> Response {
    let mut meta = Metadata::from_headers(headers);
    meta.merge(&extra);

    let envelope = RequestEnvelope {
        path: method.path().to_string(),
        body,
        metadata: meta,
    };

    match state.gateway.forward(envelope).await {
        Ok(response) => json_response(response.status, response.body),
        Err(e) => e.into_response(),
    }
}

/// The pipeline already holds the response as encoded JSON bytes; pass them
/// through without re-parsing.
fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    match Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
    {
        Ok(response) => response,
        Err(e) => GatewayError::internal(format!("response build failed: {e}")).into_response(),
    }
}

// ============================================================================
// Operational Endpoints
// ============================================================================

async fn health(State(state): State<AppState>) -> Response {
    async fn probe(gateway: &Gateway, service: ServiceName) -> bool {
        matches!(
            tokio::time::timeout(HEALTH_PING_BUDGET, gateway.ping(service)).await,
            Ok(Ok(()))
        )
    }

    let (geo, auth, user) = tokio::join!(
        probe(&state.gateway, ServiceName::Geo),
        probe(&state.gateway, ServiceName::Auth),
        probe(&state.gateway, ServiceName::User),
    );

    let all_up = geo && auth && user;
    let verdict = |up: bool| if up { "OK" } else { "FAIL" };

    let body = json!({
        "status": if all_up { "healthy" } else { "degraded" },
        "services": {
            "geo": verdict(geo),
            "auth": verdict(auth),
            "user": verdict(user),
        },
    });

    let status = if all_up {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, axum::Json(body)).into_response()
}

async fn serve_metrics() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
        .into_response()
}
