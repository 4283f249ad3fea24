//! # Portico Gateway
//!
//! Single HTTP entry point for the auth, geo and user backend services.
//!
//! Every request runs the same pipeline: resolve the target method, prepare
//! outgoing metadata (including auth delegation for protected services),
//! consult the response cache, dispatch to the backend over binary RPC,
//! write successful responses back to the cache, and translate backend
//! status codes into HTTP responses.

pub mod gateway;
pub mod metadata;
pub mod metrics;
pub mod rate_limit;
pub mod routes;
