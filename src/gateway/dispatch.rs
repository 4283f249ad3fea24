//! Method resolution and backend dispatch.
//!
//! The routable surface is a closed set, so it is an enum rather than a
//! registration table. Adding a method means adding a variant and letting
//! the compiler point at every match that needs a new arm.

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tonic::Request;

use portico_backend::{
    AuthBackend, GeoBackend, GeoRequest, GetUserRequest, ListUsersRequest, LoginRequest,
    RegisterRequest, SearchRequest, ServiceName, UserBackend,
};
use portico_error::{GatewayError, GatewayResult};

use crate::metadata::{self, Metadata};

// ============================================================================
// Method Table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    AuthRegister,
    AuthLogin,
    GeoAddressSearch,
    GeoGeocode,
    UserProfile,
    UserList,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::AuthRegister,
        Method::AuthLogin,
        Method::GeoAddressSearch,
        Method::GeoGeocode,
        Method::UserProfile,
        Method::UserList,
    ];

    /// Maps a request path onto the method table.
    ///
    /// A path under a known service but off the table is `Unimplemented`;
    /// a path under no known service is `InvalidInput`.
    pub fn resolve(path: &str) -> GatewayResult<Method> {
        match path {
            "/api/auth/register" => Ok(Method::AuthRegister),
            "/api/auth/login" => Ok(Method::AuthLogin),
            "/api/address/search" => Ok(Method::GeoAddressSearch),
            "/api/address/geocode" => Ok(Method::GeoGeocode),
            "/api/user/profile" => Ok(Method::UserProfile),
            "/api/user/list" => Ok(Method::UserList),
            other => {
                let service = other
                    .strip_prefix("/api/")
                    .and_then(|rest| rest.split('/').next())
                    .unwrap_or("");
                match service {
                    "auth" | "address" | "user" => Err(GatewayError::Unimplemented(format!(
                        "method {other} is not supported"
                    ))),
                    _ => Err(GatewayError::invalid_input(format!(
                        "unknown service in path {other}"
                    ))),
                }
            }
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Method::AuthRegister => "/api/auth/register",
            Method::AuthLogin => "/api/auth/login",
            Method::GeoAddressSearch => "/api/address/search",
            Method::GeoGeocode => "/api/address/geocode",
            Method::UserProfile => "/api/user/profile",
            Method::UserList => "/api/user/list",
        }
    }

    pub fn service(&self) -> ServiceName {
        match self {
            Method::AuthRegister | Method::AuthLogin => ServiceName::Auth,
            Method::GeoAddressSearch | Method::GeoGeocode => ServiceName::Geo,
            Method::UserProfile | Method::UserList => ServiceName::User,
        }
    }

    /// Only idempotent lookups are cacheable; auth methods and the profile
    /// read (cheap, always fresh) are not.
    pub fn cacheable(&self) -> bool {
        matches!(
            self,
            Method::GeoAddressSearch | Method::GeoGeocode | Method::UserList
        )
    }

    pub fn success_status(&self) -> StatusCode {
        match self {
            Method::AuthRegister => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// The three backend clients the gateway forwards to.
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthBackend>,
    pub geo: Arc<dyn GeoBackend>,
    pub user: Arc<dyn UserBackend>,
}

impl Backends {
    /// Decodes the body into the method's request type, forwards it with the
    /// prepared metadata, and re-encodes the backend response.
    ///
    /// Decoding happens before any backend call so a malformed body never
    /// leaves the gateway.
    pub async fn dispatch(
        &self,
        method: Method,
        body: &[u8],
        metadata: &Metadata,
    ) -> GatewayResult<(Vec<u8>, StatusCode)> {
        let body = match method {
            Method::AuthRegister => {
                let req: RegisterRequest = decode(body)?;
                encode(&self.auth.register(rpc(req, metadata)).await?)?
            }
            Method::AuthLogin => {
                let req: LoginRequest = decode(body)?;
                encode(&self.auth.login(rpc(req, metadata)).await?)?
            }
            Method::GeoAddressSearch => {
                let req: SearchRequest = decode(body)?;
                encode(&self.geo.address_search(rpc(req, metadata)).await?)?
            }
            Method::GeoGeocode => {
                let req: GeoRequest = decode(body)?;
                encode(&self.geo.geo_code(rpc(req, metadata)).await?)?
            }
            Method::UserProfile => {
                let req = profile_request(metadata)?;
                encode(&self.user.get_user_profile(rpc(req, metadata)).await?)?
            }
            Method::UserList => {
                let req = list_request(metadata);
                encode(&self.user.list_users(rpc(req, metadata)).await?)?
            }
        };
        Ok((body, method.success_status()))
    }

    pub async fn ping(&self, service: ServiceName) -> Result<(), tonic::Status> {
        match service {
            ServiceName::Auth => self.auth.ping().await,
            ServiceName::Geo => self.geo.ping().await,
            ServiceName::User => self.user.ping().await,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> GatewayResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::invalid_input(format!("malformed request body: {e}")))
}

fn encode<T: Serialize>(response: &T) -> GatewayResult<Vec<u8>> {
    serde_json::to_vec(response)
        .map_err(|e| GatewayError::internal(format!("response encoding failed: {e}")))
}

fn rpc<T>(message: T, metadata: &Metadata) -> Request<T> {
    let mut request = Request::new(message);
    *request.metadata_mut() = metadata.to_tonic();
    request
}

/// The profile lookup targets the authenticated subject, never a
/// caller-chosen id.
fn profile_request(metadata: &Metadata) -> GatewayResult<GetUserRequest> {
    let user_id = metadata
        .get(metadata::SUBJECT_ID)
        .ok_or_else(|| GatewayError::unauthenticated("missing authorization token"))?;
    Ok(GetUserRequest {
        user_id: user_id.to_string(),
    })
}

fn list_request(metadata: &Metadata) -> ListUsersRequest {
    let parse = |key: &str, default: i32| {
        metadata
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    };
    ListUsersRequest {
        limit: parse(metadata::LIMIT, 10),
        offset: parse(metadata::OFFSET, 0),
    }
}
