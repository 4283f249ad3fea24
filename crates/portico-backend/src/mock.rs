//! In-process backend doubles for tests.
//!
//! The mocks record every call so tests can assert which backends the
//! gateway actually reached, in particular that cached or rejected requests
//! never touch a backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tonic::{Request, Status};

use crate::proto::*;
use crate::traits::{AuthBackend, GeoBackend, UserBackend};

fn metadata_value(request: &Request<impl prost::Message>, key: &str) -> Option<String> {
    request
        .metadata()
        .get(key)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Default)]
pub struct MockAuthBackend {
    users: Mutex<HashMap<String, (String, String)>>,
    tokens: Mutex<HashMap<String, String>>,
    next_id: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    /// When set, validate_token fails with UNAVAILABLE instead of answering.
    pub fail_validate: AtomicBool,
}

impl MockAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a token the mock will accept, returning the subject it maps to.
    pub fn issue_token(&self, token: &str, user_id: &str) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), user_id.to_string());
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<RegisterResponse, Status> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&req.email) {
            return Err(Status::already_exists("user already exists"));
        }
        let user_id = format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        users.insert(req.email, (req.password, user_id.clone()));
        Ok(RegisterResponse { user_id })
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<LoginResponse, Status> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        let users = self.users.lock().unwrap();
        match users.get(&req.email) {
            Some((password, user_id)) if *password == req.password => {
                let token = format!("token-{user_id}");
                self.tokens
                    .lock()
                    .unwrap()
                    .insert(token.clone(), user_id.clone());
                Ok(LoginResponse {
                    token,
                    user_id: user_id.clone(),
                    expires_at: 4_102_444_800,
                })
            }
            _ => Err(Status::unauthenticated("invalid credentials")),
        }
    }

    async fn validate_token(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<TokenResponse, Status> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_validate.load(Ordering::SeqCst) {
            return Err(Status::unavailable("auth backend down"));
        }
        let req = request.into_inner();
        match self.tokens.lock().unwrap().get(&req.token) {
            Some(user_id) => Ok(TokenResponse {
                valid: true,
                user_id: user_id.clone(),
            }),
            None => Ok(TokenResponse {
                valid: false,
                user_id: String::new(),
            }),
        }
    }

    async fn ping(&self) -> Result<(), Status> {
        if self.fail_validate.load(Ordering::SeqCst) {
            return Err(Status::unavailable("auth backend down"));
        }
        Ok(())
    }
}

// ============================================================================
// Geo
// ============================================================================

#[derive(Default)]
pub struct MockGeoBackend {
    pub search_calls: AtomicUsize,
    pub geocode_calls: AtomicUsize,
    /// subject-id metadata observed on the most recent call.
    pub last_subject: Mutex<Option<String>>,
}

impl MockGeoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn canned_response() -> AddressesResponse {
        AddressesResponse {
            addresses: vec![Address {
                city: "Moscow".to_string(),
                street: "Tverskaya".to_string(),
                house: "7".to_string(),
                lat: "55.7601".to_string(),
                lon: "37.6086".to_string(),
            }],
        }
    }
}

#[async_trait]
impl GeoBackend for MockGeoBackend {
    async fn address_search(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<AddressesResponse, Status> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_subject.lock().unwrap() = metadata_value(&request, "subject-id");
        Ok(Self::canned_response())
    }

    async fn geo_code(&self, request: Request<GeoRequest>) -> Result<AddressesResponse, Status> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_subject.lock().unwrap() = metadata_value(&request, "subject-id");
        Ok(Self::canned_response())
    }

    async fn ping(&self) -> Result<(), Status> {
        Ok(())
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Default)]
pub struct MockUserBackend {
    pub profile_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    /// Paging observed on the most recent list call.
    pub last_page: Mutex<Option<(i32, i32)>>,
    pub last_profile_request: Mutex<Option<GetUserRequest>>,
}

impl MockUserBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserBackend for MockUserBackend {
    async fn get_user_profile(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<UserProfile, Status> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        *self.last_profile_request.lock().unwrap() = Some(req.clone());
        Ok(UserProfile {
            id: req.user_id,
            email: "user@example.com".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })
    }

    async fn list_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<ListUsersResponse, Status> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        *self.last_page.lock().unwrap() = Some((req.limit, req.offset));
        Ok(ListUsersResponse {
            users: vec![UserProfile {
                id: "user-1".to_string(),
                email: "user@example.com".to_string(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
            }],
            total_count: 1,
        })
    }

    async fn ping(&self) -> Result<(), Status> {
        Ok(())
    }
}
