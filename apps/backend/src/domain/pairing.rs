//! Pairing request entity: an invitation to start a session, pending
//! responder action. Transient; owned by the pairing exchange and removed
//! once resolved.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    Lesson,
    Friendly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct PairingRequest {
    pub id: Uuid,
    pub initiator: Identity,
    /// `Some` for a targeted invitation, `None` for a broadcast to the
    /// opposing role.
    pub target: Option<String>,
    pub mode: PairingMode,
    pub status: RequestStatus,
    /// Identities the request was offered to. Used to withdraw the offer
    /// from everyone else once somebody accepts.
    pub offered_to: Vec<Identity>,
    /// Responders who declined a broadcast request. They are excluded from
    /// accepting it later; the request stays open for everyone else.
    pub declined_by: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl PairingRequest {
    pub fn new(
        initiator: Identity,
        target: Option<String>,
        mode: PairingMode,
        offered_to: Vec<Identity>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            initiator,
            target,
            mode,
            status: RequestStatus::Pending,
            offered_to,
            declined_by: Vec::new(),
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.is_none()
    }

    /// May `sub` accept this request right now? Checks resolution state,
    /// targeting and prior declines; busy-ness is the exchange's concern.
    pub fn may_accept(&self, sub: &str) -> Result<(), DomainError> {
        if !self.is_pending() {
            return Err(DomainError::already_resolved("request is already resolved"));
        }
        if self.initiator.sub == sub {
            return Err(DomainError::not_eligible(
                "initiator cannot accept their own request",
            ));
        }
        if let Some(target) = &self.target {
            if target != sub {
                return Err(DomainError::not_eligible(
                    "request is targeted at another responder",
                ));
            }
        }
        if self.declined_by.iter().any(|d| d == sub) {
            return Err(DomainError::not_eligible(
                "responder already declined this request",
            ));
        }
        Ok(())
    }
}
