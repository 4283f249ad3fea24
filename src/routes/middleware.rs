//! HTTP middleware for the API routes.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderName, HeaderValue};
use uuid::Uuid;

use crate::metrics;
use crate::routes::AppState;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Honors an inbound `x-request-id`, otherwise injects a fresh UUID. The id
/// rides the request into backend metadata (it is `x-` prefixed) and is
/// echoed on the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    match HeaderValue::from_str(&id) {
        Ok(value) => {
            request.headers_mut().insert(REQUEST_ID.clone(), value.clone());
            let mut response = next.run(request).await;
            response.headers_mut().insert(REQUEST_ID, value);
            response
        }
        Err(_) => next.run(request).await,
    }
}

pub async fn record_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_request(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Per-client rate limiting keyed by IP.
///
/// Proxy headers are trusted first so limits apply to the real client
/// behind a load balancer, then the socket peer address.
pub async fn rate_limiting(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match client_ip(&request) {
        Some(ip) => match state.limiter.check(ip) {
            Ok(()) => next.run(request).await,
            Err(e) => e.into_response(),
        },
        // No identifiable client; counting everyone as one bucket would let
        // a single peer starve the rest.
        None => next.run(request).await,
    }
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    let headers = request.headers();

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return Some(ip);
            }
        }
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
    {
        return Some(ip);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}
