//! Tonic channel clients for the backend services.
//!
//! Each client wraps the shared [`Channel`] established at startup and issues
//! unary calls over it. The method paths mirror the backend service
//! definitions; the codec is prost on both sides.

use async_trait::async_trait;
use http::uri::PathAndQuery;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::transport::Channel;
use tonic::{Request, Status};

use crate::proto::*;
use crate::traits::{AuthBackend, GeoBackend, UserBackend};

async fn unary<Req, Resp>(
    channel: &Channel,
    path: &'static str,
    request: Request<Req>,
) -> Result<Resp, Status>
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    let mut grpc = Grpc::new(channel.clone());
    grpc.ready()
        .await
        .map_err(|e| Status::unavailable(format!("backend connection not ready: {e}")))?;
    let codec: ProstCodec<Req, Resp> = ProstCodec::default();
    let path = PathAndQuery::from_static(path);
    Ok(grpc.unary(request, path, codec).await?.into_inner())
}

async fn ready(channel: &Channel) -> Result<(), Status> {
    Grpc::new(channel.clone())
        .ready()
        .await
        .map_err(|e| Status::unavailable(format!("backend connection not ready: {e}")))
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Clone)]
pub struct AuthClient {
    channel: Channel,
}

impl AuthClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<RegisterResponse, Status> {
        unary(&self.channel, "/auth.AuthService/Register", request).await
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<LoginResponse, Status> {
        unary(&self.channel, "/auth.AuthService/Login", request).await
    }

    async fn validate_token(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<TokenResponse, Status> {
        unary(&self.channel, "/auth.AuthService/ValidateToken", request).await
    }

    async fn ping(&self) -> Result<(), Status> {
        ready(&self.channel).await
    }
}

// ============================================================================
// Geo
// ============================================================================

#[derive(Clone)]
pub struct GeoClient {
    channel: Channel,
}

impl GeoClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl GeoBackend for GeoClient {
    async fn address_search(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<AddressesResponse, Status> {
        unary(&self.channel, "/geo.GeoService/AddressSearch", request).await
    }

    async fn geo_code(&self, request: Request<GeoRequest>) -> Result<AddressesResponse, Status> {
        unary(&self.channel, "/geo.GeoService/GeoCode", request).await
    }

    async fn ping(&self) -> Result<(), Status> {
        ready(&self.channel).await
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Clone)]
pub struct UserClient {
    channel: Channel,
}

impl UserClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl UserBackend for UserClient {
    async fn get_user_profile(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<UserProfile, Status> {
        unary(&self.channel, "/user.UserService/GetUserProfile", request).await
    }

    async fn list_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<ListUsersResponse, Status> {
        unary(&self.channel, "/user.UserService/ListUsers", request).await
    }

    async fn ping(&self) -> Result<(), Status> {
        ready(&self.channel).await
    }
}
