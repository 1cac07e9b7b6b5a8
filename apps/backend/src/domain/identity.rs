use serde::{Deserialize, Serialize};

/// Participant role on the platform.
///
/// Broadcast pairing requests are offered to the opposing role only: a
/// learner looking for a session is matched with coaches and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coach,
    Learner,
}

impl Role {
    pub fn opposing(self) -> Role {
        match self {
            Role::Coach => Role::Learner,
            Role::Learner => Role::Coach,
        }
    }
}

/// An authenticated participant as asserted by the auth collaborator.
///
/// The `sub` is the opaque identity key; this core never stores identities,
/// it only carries them for the lifetime of connections and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub sub: String,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(sub: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            sub: sub.into(),
            display_name: display_name.into(),
            role,
        }
    }
}
