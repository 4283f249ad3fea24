//! Auth delegation.
//!
//! The gateway never verifies credentials itself; it unwraps whatever token
//! shape the caller sent and asks the auth backend whether it is valid.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tonic::Request;
use tracing::{debug, warn};

use portico_backend::{AuthBackend, TokenRequest};
use portico_error::{GatewayError, GatewayResult};

/// The one message every authentication failure carries. A caller cannot
/// tell a rejected token from an unreachable auth backend.
const INVALID_TOKEN: &str = "invalid token";

/// Identity established for the request by the auth backend.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject_id: String,
    /// The unwrapped token, re-sent to backends as `Bearer {token}`.
    pub token: String,
}

#[derive(Clone)]
pub struct AuthDelegate {
    auth: Arc<dyn AuthBackend>,
}

impl AuthDelegate {
    pub fn new(auth: Arc<dyn AuthBackend>) -> Self {
        Self { auth }
    }

    /// Unwraps the raw header value and delegates validation to the auth
    /// backend.
    pub async fn resolve(&self, raw: &str) -> GatewayResult<AuthContext> {
        let token = unwrap_token(raw);
        if token.is_empty() {
            return Err(GatewayError::unauthenticated(INVALID_TOKEN));
        }

        let request = Request::new(TokenRequest {
            token: token.clone(),
        });
        match self.auth.validate_token(request).await {
            Ok(response) if response.valid => Ok(AuthContext {
                subject_id: response.user_id,
                token,
            }),
            Ok(_) => {
                debug!("Auth backend rejected token");
                Err(GatewayError::unauthenticated(INVALID_TOKEN))
            }
            Err(status) => {
                warn!(error = %status, "Token validation call failed");
                Err(GatewayError::unauthenticated(INVALID_TOKEN))
            }
        }
    }
}

/// Ordered token decoder chain.
///
/// 1. Strip a `Bearer ` prefix if present.
/// 2. If the remainder base64-decodes to a JSON object with a non-empty
///    `token` field, use that nested token.
/// 3. Otherwise the remainder is the token.
///
/// Malformed wrappers fall through to step 3 rather than failing.
fn unwrap_token(raw: &str) -> String {
    #[derive(Deserialize)]
    struct TokenWrapper {
        #[serde(default)]
        token: String,
    }

    let value = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

    if let Ok(decoded) = BASE64.decode(value) {
        if let Ok(wrapper) = serde_json::from_slice::<TokenWrapper>(&decoded) {
            if !wrapper.token.is_empty() {
                return wrapper.token;
            }
        }
    }

    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_backend::mock::MockAuthBackend;
    use std::sync::atomic::Ordering;

    #[test]
    fn plain_token_passes_through() {
        assert_eq!(unwrap_token("abc123"), "abc123");
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(unwrap_token("Bearer abc123"), "abc123");
    }

    #[test]
    fn base64_json_wrapper_is_unwrapped() {
        let wrapped = BASE64.encode(br#"{"token":"inner-token"}"#);
        assert_eq!(unwrap_token(&wrapped), "inner-token");
        assert_eq!(unwrap_token(&format!("Bearer {wrapped}")), "inner-token");
    }

    #[test]
    fn malformed_wrapper_falls_back_to_raw_value() {
        // Base64 of plain text that is not JSON.
        let not_json = BASE64.encode(b"hello world");
        assert_eq!(unwrap_token(&not_json), not_json);

        // JSON object without a token field.
        let empty_token = BASE64.encode(br#"{"user":"x"}"#);
        assert_eq!(unwrap_token(&empty_token), empty_token);
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let auth = Arc::new(MockAuthBackend::new());
        auth.issue_token("good", "user-7");
        let delegate = AuthDelegate::new(auth);

        let ctx = delegate.resolve("Bearer good").await.unwrap();
        assert_eq!(ctx.subject_id, "user-7");
        assert_eq!(ctx.token, "good");
    }

    #[tokio::test]
    async fn rejected_and_unreachable_are_indistinguishable() {
        let auth = Arc::new(MockAuthBackend::new());
        let delegate = AuthDelegate::new(auth.clone());

        let rejected = delegate.resolve("Bearer unknown").await.unwrap_err();

        auth.fail_validate.store(true, Ordering::SeqCst);
        let unreachable = delegate.resolve("Bearer unknown").await.unwrap_err();

        assert_eq!(rejected.status_code(), unreachable.status_code());
        assert_eq!(rejected.user_message(), unreachable.user_message());
        assert_eq!(rejected.user_message(), INVALID_TOKEN);
    }

    #[tokio::test]
    async fn empty_token_skips_the_backend() {
        let auth = Arc::new(MockAuthBackend::new());
        let delegate = AuthDelegate::new(auth.clone());

        delegate.resolve("Bearer ").await.unwrap_err();
        assert_eq!(auth.validate_calls.load(Ordering::SeqCst), 0);
    }
}
