//! Outgoing request metadata.
//!
//! An ordered multimap built from the caller's forwardable headers plus the
//! fields the gateway injects itself. Gateway-injected fields always win
//! over caller-supplied ones so a client can never smuggle its own
//! `subject-id` past auth delegation.

use http::HeaderMap;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};

pub const SUBJECT_ID: &str = "subject-id";
pub const AUTHORIZATION: &str = "authorization";
pub const LIMIT: &str = "limit";
pub const OFFSET: &str = "offset";

/// Header prefixes that callers may forward to backends.
const FORWARDABLE_PREFIXES: [&str; 2] = ["x-", "grpc-"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the forwardable subset of incoming HTTP headers.
    ///
    /// Only `x-` and `grpc-` prefixed headers plus `authorization` pass
    /// through; everything else stays at the edge. Keys are lowercased and
    /// non-UTF-8 values are dropped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut metadata = Self::new();
        for (name, value) in headers {
            let key = name.as_str().to_ascii_lowercase();
            let forwardable = key == AUTHORIZATION
                || FORWARDABLE_PREFIXES.iter().any(|p| key.starts_with(p));
            if !forwardable {
                continue;
            }
            if let Ok(value) = value.to_str() {
                metadata.append(&key, value);
            }
        }
        metadata
    }

    /// Adds a value without disturbing existing ones under the same key.
    pub fn append(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    /// Replaces every value under the key with a single one.
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.retain(|(k, _)| k != key);
        self.append(key, value);
    }

    /// First value under the key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Overlays `overrides` onto this map; for every key present in
    /// `overrides`, its values fully replace the existing ones.
    pub fn merge(&mut self, overrides: &Metadata) {
        for (key, value) in &overrides.entries {
            if self.entries.iter().any(|(k, _)| k == key) {
                self.set(key, value);
            } else {
                self.append(key, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts to tonic metadata for the outgoing RPC.
    ///
    /// Entries that are not valid gRPC metadata (non-ascii keys or values)
    /// are skipped rather than failing the request.
    pub fn to_tonic(&self) -> MetadataMap {
        let mut map = MetadataMap::new();
        for (key, value) in &self.entries {
            let Ok(key) = key.parse::<MetadataKey<Ascii>>() else {
                continue;
            };
            let Ok(value) = value.parse::<MetadataValue<Ascii>>() else {
                continue;
            };
            map.append(key, value);
        }
        map
    }
}
