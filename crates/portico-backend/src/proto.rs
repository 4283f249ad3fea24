//! Wire types for the backend RPC contract.
//!
//! Each message derives both `prost::Message` for the binary RPC encoding
//! and serde for the JSON boundary with web clients. The serde codec is the
//! one the gateway decodes request bodies with and re-encodes responses
//! with, so the pair is symmetric for every method.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth service
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    #[prost(string, tag = "1")]
    pub email: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterResponse {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub email: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    #[prost(string, tag = "1")]
    pub token: String,
    #[prost(string, tag = "2")]
    pub user_id: String,
    /// Unix timestamp of token expiry.
    #[prost(int64, tag = "3")]
    pub expires_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    #[prost(bool, tag = "1")]
    pub valid: bool,
    #[prost(string, tag = "2")]
    pub user_id: String,
}

// ============================================================================
// Geo service
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    #[prost(string, tag = "1")]
    pub query: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoRequest {
    #[prost(string, tag = "1")]
    pub lat: String,
    #[prost(string, tag = "2")]
    pub lng: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[prost(string, tag = "1")]
    pub city: String,
    #[prost(string, tag = "2")]
    pub street: String,
    #[prost(string, tag = "3")]
    pub house: String,
    #[prost(string, tag = "4")]
    pub lat: String,
    #[prost(string, tag = "5")]
    pub lon: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressesResponse {
    #[prost(message, repeated, tag = "1")]
    pub addresses: Vec<Address>,
}

// ============================================================================
// User service
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub email: String,
    #[prost(string, tag = "3")]
    pub created_at: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListUsersRequest {
    #[prost(int32, tag = "1")]
    pub limit: i32,
    #[prost(int32, tag = "2")]
    pub offset: i32,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListUsersResponse {
    #[prost(message, repeated, tag = "1")]
    pub users: Vec<UserProfile>,
    #[prost(int32, tag = "2")]
    pub total_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_round_trip<T>(value: &T)
    where
        T: Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let encoded = serde_json::to_vec(value).unwrap();
        let decoded: T = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(&decoded, value);
    }

    #[test]
    fn response_codecs_are_symmetric() {
        json_round_trip(&RegisterResponse {
            user_id: "42".to_string(),
        });
        json_round_trip(&LoginResponse {
            token: "tok".to_string(),
            user_id: "42".to_string(),
            expires_at: 1_700_000_000,
        });
        json_round_trip(&AddressesResponse {
            addresses: vec![Address {
                city: "Moscow".to_string(),
                street: "Arbat".to_string(),
                house: "1".to_string(),
                lat: "55.7558".to_string(),
                lon: "37.6173".to_string(),
            }],
        });
        json_round_trip(&UserProfile {
            id: "42".to_string(),
            email: "a@b.com".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        });
        json_round_trip(&ListUsersResponse {
            users: vec![UserProfile::default()],
            total_count: 1,
        });
    }

    #[test]
    fn request_codecs_are_symmetric() {
        json_round_trip(&RegisterRequest {
            email: "a@b.com".to_string(),
            password: "longenough1".to_string(),
        });
        json_round_trip(&LoginRequest {
            email: "a@b.com".to_string(),
            password: "longenough1".to_string(),
        });
        json_round_trip(&SearchRequest {
            query: "Moscow".to_string(),
        });
        json_round_trip(&GeoRequest {
            lat: "55.7558".to_string(),
            lng: "37.6173".to_string(),
        });
        json_round_trip(&GetUserRequest {
            user_id: "42".to_string(),
        });
        json_round_trip(&ListUsersRequest {
            limit: 10,
            offset: 0,
        });
    }

    #[test]
    fn missing_json_fields_decode_to_defaults() {
        let req: ListUsersRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.limit, 0);
        assert_eq!(req.offset, 0);

        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert!(req.query.is_empty());
    }
}
