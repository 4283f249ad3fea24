//! Client traits for the three backend services.
//!
//! The gateway holds these as trait objects so the request pipeline can be
//! exercised against in-process doubles (see [`crate::mock`]) as well as the
//! tonic channel clients.

use crate::proto::*;
use async_trait::async_trait;
use tonic::{Request, Status};

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn register(&self, request: Request<RegisterRequest>)
    -> Result<RegisterResponse, Status>;

    async fn login(&self, request: Request<LoginRequest>) -> Result<LoginResponse, Status>;

    async fn validate_token(&self, request: Request<TokenRequest>)
    -> Result<TokenResponse, Status>;

    /// Liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), Status>;
}

#[async_trait]
pub trait GeoBackend: Send + Sync {
    async fn address_search(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<AddressesResponse, Status>;

    async fn geo_code(&self, request: Request<GeoRequest>) -> Result<AddressesResponse, Status>;

    async fn ping(&self) -> Result<(), Status>;
}

#[async_trait]
pub trait UserBackend: Send + Sync {
    async fn get_user_profile(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<UserProfile, Status>;

    async fn list_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<ListUsersResponse, Status>;

    async fn ping(&self) -> Result<(), Status>;
}
