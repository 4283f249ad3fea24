use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error taxonomy.
///
/// Every failure a request can surface to the caller is one of these
/// variants. Backend RPC statuses are translated through
/// [`GatewayError::from`], which is the single mapping point from the
/// backend error domain to the transport error domain.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Malformed body or unknown target service.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Known service, but the method path is not part of its contract.
    #[error("method not implemented: {0}")]
    Unimplemented(String),

    /// Missing, invalid, or unverifiable bearer token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid token, insufficient scope for the requested resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate resource, e.g. registering an existing email.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("too many requests: {0}")]
    TooManyRequests(String),

    /// Backend unreachable or the per-request deadline elapsed.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Unexpected local failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message. Backend messages pass through verbatim for
    /// client-error classes; server errors never expose internal detail.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::InvalidInput(msg)
            | GatewayError::Unimplemented(msg)
            | GatewayError::Unauthenticated(msg)
            | GatewayError::PermissionDenied(msg)
            | GatewayError::NotFound(msg)
            | GatewayError::Conflict(msg)
            | GatewayError::TooManyRequests(msg)
            | GatewayError::Unavailable(msg) => msg.clone(),
            GatewayError::Internal(_) => "internal server error".to_string(),
        }
    }

    /// Log this error with a level matching its severity.
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = %self, "request rejected");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "client error");
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        GatewayError::InvalidInput(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        GatewayError::Unauthenticated(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        GatewayError::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        GatewayError::Internal(msg.into())
    }
}

/// Translation from backend RPC statuses to the transport error domain.
///
/// The mapping table is fixed; unrecognized codes collapse to `Internal`.
impl From<tonic::Status> for GatewayError {
    fn from(status: tonic::Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            tonic::Code::InvalidArgument => GatewayError::InvalidInput(message),
            tonic::Code::Unauthenticated => GatewayError::Unauthenticated(message),
            tonic::Code::PermissionDenied => GatewayError::PermissionDenied(message),
            tonic::Code::NotFound => GatewayError::NotFound(message),
            tonic::Code::AlreadyExists => GatewayError::Conflict(message),
            tonic::Code::Unimplemented => GatewayError::Unimplemented(message),
            tonic::Code::Unavailable | tonic::Code::DeadlineExceeded => {
                GatewayError::Unavailable(message)
            }
            _ => GatewayError::Internal(message),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let body = json!({
            "error": self.user_message(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_status_mapping() {
        let cases = [
            (tonic::Code::InvalidArgument, StatusCode::BAD_REQUEST),
            (tonic::Code::Unauthenticated, StatusCode::UNAUTHORIZED),
            (tonic::Code::PermissionDenied, StatusCode::FORBIDDEN),
            (tonic::Code::NotFound, StatusCode::NOT_FOUND),
            (tonic::Code::AlreadyExists, StatusCode::CONFLICT),
            (tonic::Code::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
            (tonic::Code::Internal, StatusCode::INTERNAL_SERVER_ERROR),
            (tonic::Code::Unknown, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (code, expected) in cases {
            let err = GatewayError::from(tonic::Status::new(code, "boom"));
            assert_eq!(err.status_code(), expected, "code {code:?}");
        }
    }

    #[test]
    fn backend_message_passes_through_for_client_errors() {
        let err = GatewayError::from(tonic::Status::already_exists("user already exists"));
        assert_eq!(err.user_message(), "user already exists");
    }

    #[test]
    fn internal_message_is_generic() {
        let err = GatewayError::Internal("sql constraint violated".to_string());
        assert_eq!(err.user_message(), "internal server error");
    }
}
