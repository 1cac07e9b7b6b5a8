//! Pairing exchange: outstanding invitations between an initiator and
//! either a named responder or the pool of eligible responders.
//!
//! First accept wins: resolution happens under the request's shard lock,
//! so a concurrent second accept observes the resolved status and fails
//! with `AlreadyResolved`. Resolved requests linger as tombstones for a
//! short window (so race losers see `AlreadyResolved` rather than a bare
//! `NotFound`) and are then swept. The one-active-session guarantee
//! itself is enforced one level down, by the registry's creation step.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::domain::pairing::{PairingMode, PairingRequest, RequestStatus};
use crate::domain::session::TimeControl;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::services::presence::PresenceDirectory;
use crate::services::session_registry::{SessionEntry, SessionRegistry};
use crate::ws::protocol::ServerMsg;

/// How long a resolved request stays visible before it is swept.
const RESOLVED_REQUEST_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub request_id: Uuid,
    pub status: RequestStatus,
}

pub struct PairingExchange {
    requests: Arc<DashMap<Uuid, PairingRequest>>,
    presence: Arc<PresenceDirectory>,
    sessions: Arc<SessionRegistry>,
}

impl PairingExchange {
    pub fn new(presence: Arc<PresenceDirectory>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            presence,
            sessions,
        }
    }

    /// Open a pairing request and offer it to eligible responders.
    ///
    /// Comes back `Unavailable` (and is not stored) when the initiator is
    /// busy, or when a targeted responder is unreachable, busy, or the
    /// initiator themselves. A broadcast request goes to every reachable,
    /// non-busy identity of the opposing role; any one of them may accept.
    pub fn submit(
        &self,
        initiator: Identity,
        mode: PairingMode,
        target: Option<String>,
    ) -> SubmitOutcome {
        let unavailable = SubmitOutcome {
            request_id: Uuid::new_v4(),
            status: RequestStatus::Unavailable,
        };

        if self.sessions.is_busy(&initiator.sub) {
            return unavailable;
        }

        let offered: Vec<Identity> = match &target {
            Some(t) => {
                if *t == initiator.sub || self.sessions.is_busy(t) {
                    return unavailable;
                }
                match self.presence.identity_of(t) {
                    Some(identity) => vec![identity],
                    None => return unavailable,
                }
            }
            None => self
                .presence
                .reachable_identities()
                .into_iter()
                .filter(|i| i.role == initiator.role.opposing())
                .filter(|i| i.sub != initiator.sub)
                .filter(|i| !self.sessions.is_busy(&i.sub))
                .collect(),
        };

        let request = PairingRequest::new(
            initiator.clone(),
            target,
            mode,
            offered.clone(),
            OffsetDateTime::now_utc(),
        );
        let request_id = request.id;
        self.requests.insert(request_id, request);

        let offer = ServerMsg::RequestOffer {
            request_id,
            from: initiator,
            mode,
        };
        for identity in &offered {
            self.presence.send_to(&identity.sub, offer.clone());
        }
        info!(request_id = %request_id, offered = offered.len(), "pairing request submitted");

        SubmitOutcome {
            request_id,
            status: RequestStatus::Pending,
        }
    }

    /// Accept a pending request and create the session.
    ///
    /// Fails `AlreadyResolved` for the loser of an accept race,
    /// `NotEligible` when the responder is busy, was not the target, had
    /// declined, or when the initiator became busy in the interim. On
    /// success every other responder the request was offered to is told
    /// it is no longer available.
    pub fn accept(
        &self,
        request_id: Uuid,
        responder: &Identity,
        time_control: TimeControl,
    ) -> Result<(PairingRequest, Arc<SessionEntry>), AppError> {
        if self.sessions.is_busy(&responder.sub) {
            return Err(
                DomainError::not_eligible("responder is already in an active session").into(),
            );
        }

        // Resolve under the request's shard lock: first accept wins.
        let request = {
            let mut entry = self.requests.get_mut(&request_id).ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Request, "unknown or expired pairing request")
            })?;
            entry.may_accept(&responder.sub)?;
            if self.sessions.is_busy(&entry.initiator.sub) {
                entry.status = RequestStatus::Unavailable;
                drop(entry);
                self.schedule_sweep(request_id);
                return Err(DomainError::not_eligible(
                    "initiator joined another session in the meantime",
                )
                .into());
            }
            entry.status = RequestStatus::Accepted;
            entry.clone()
        };
        self.schedule_sweep(request_id);

        let session = self
            .sessions
            .create(
                request.initiator.clone(),
                responder.clone(),
                request.mode,
                time_control,
                OffsetDateTime::now_utc(),
            )
            .map_err(AppError::from)?;

        // Withdraw the offer from everyone who didn't win it.
        let withdrawn = ServerMsg::RequestResolved {
            request_id,
            status: RequestStatus::Unavailable,
        };
        for identity in &request.offered_to {
            if identity.sub != responder.sub {
                self.presence.send_to(&identity.sub, withdrawn.clone());
            }
        }
        info!(request_id = %request_id, session_id = %session.id(), "pairing request accepted");

        Ok((request, session))
    }

    /// Decline: a targeted request resolves and the initiator hears about
    /// it; a broadcast request stays open for everyone but the decliner.
    pub fn decline(&self, request_id: Uuid, responder: &Identity) -> Result<(), AppError> {
        let initiator_sub = {
            let mut entry = self.requests.get_mut(&request_id).ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Request, "unknown or expired pairing request")
            })?;
            if !entry.is_pending() {
                return Err(DomainError::already_resolved("request is already resolved").into());
            }
            match &entry.target {
                Some(target) => {
                    if *target != responder.sub {
                        return Err(DomainError::not_eligible(
                            "request is targeted at another responder",
                        )
                        .into());
                    }
                    entry.status = RequestStatus::Declined;
                    Some(entry.initiator.sub.clone())
                }
                None => {
                    if !entry.declined_by.contains(&responder.sub) {
                        entry.declined_by.push(responder.sub.clone());
                    }
                    None
                }
            }
        };

        if let Some(initiator_sub) = initiator_sub {
            self.schedule_sweep(request_id);
            self.presence.send_to(
                &initiator_sub,
                ServerMsg::RequestResolved {
                    request_id,
                    status: RequestStatus::Declined,
                },
            );
        }
        debug!(request_id = %request_id, sub = %responder.sub, "pairing request declined");
        Ok(())
    }

    /// Only the initiator may cancel, and only while still pending.
    pub fn cancel(&self, request_id: Uuid, initiator_sub: &str) -> Result<(), AppError> {
        let request = {
            let mut entry = self.requests.get_mut(&request_id).ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Request, "unknown or expired pairing request")
            })?;
            if entry.initiator.sub != initiator_sub {
                return Err(
                    DomainError::not_eligible("only the initiator may cancel a request").into(),
                );
            }
            if !entry.is_pending() {
                return Err(DomainError::already_resolved("request is already resolved").into());
            }
            entry.status = RequestStatus::Cancelled;
            entry.clone()
        };
        self.schedule_sweep(request_id);

        let resolved = ServerMsg::RequestResolved {
            request_id,
            status: RequestStatus::Cancelled,
        };
        for identity in &request.offered_to {
            self.presence.send_to(&identity.sub, resolved.clone());
        }
        info!(request_id = %request_id, "pairing request cancelled");
        Ok(())
    }

    /// Whether a request is still open for acceptance.
    pub fn is_open(&self, request_id: Uuid) -> bool {
        self.requests
            .get(&request_id)
            .map(|entry| entry.is_pending())
            .unwrap_or(false)
    }

    /// Tombstoned requests are dropped once nobody can plausibly still be
    /// racing for them.
    fn schedule_sweep(&self, request_id: Uuid) {
        let requests = self.requests.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESOLVED_REQUEST_TTL).await;
            requests.remove_if(&request_id, |_, entry| !entry.is_pending());
        });
    }
}
