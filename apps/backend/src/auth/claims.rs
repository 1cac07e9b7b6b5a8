//! Claims carried by backend-issued access tokens.
//!
//! The credential presented at the websocket handshake is minted by the
//! auth collaborator (or by the short-lived token route) and already
//! carries everything this core needs to know about a participant; no
//! user store is consulted.

use serde::{Deserialize, Serialize};

use crate::domain::identity::{Identity, Role};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// External participant identifier
    pub sub: String,
    /// Name shown to the peer
    pub name: String,
    pub role: Role,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

impl AccessClaims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.name.clone(), self.role)
    }
}
