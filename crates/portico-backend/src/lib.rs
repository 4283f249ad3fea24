//! # Portico Backend
//!
//! The RPC contract between the gateway and its three backend services.
//!
//! ## Design Principles
//!
//! - **No business logic** - the backends own their semantics, this crate
//!   only carries requests to them
//! - **Traits at the seam** - the gateway depends on [`AuthBackend`],
//!   [`GeoBackend`] and [`UserBackend`], never on a concrete transport
//! - **One channel per service** - connected once at startup, shared by
//!   every request for the process lifetime

mod clients;
mod connect;
pub mod mock;
mod proto;
mod traits;

pub use clients::{AuthClient, GeoClient, UserClient};
pub use connect::{ConnectError, ConnectPolicy, connect};
pub use proto::*;
pub use traits::{AuthBackend, GeoBackend, UserBackend};

use std::fmt;
use std::str::FromStr;

/// The three backend services the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceName {
    Auth,
    Geo,
    User,
}

impl ServiceName {
    pub const ALL: [ServiceName; 3] = [ServiceName::Geo, ServiceName::Auth, ServiceName::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Auth => "auth",
            ServiceName::Geo => "geo",
            ServiceName::User => "user",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(ServiceName::Auth),
            "geo" => Ok(ServiceName::Geo),
            "user" => Ok(ServiceName::User),
            _ => Err(()),
        }
    }
}
