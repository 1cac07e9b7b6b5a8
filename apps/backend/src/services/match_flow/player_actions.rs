//! Player-originated session mutations: moves, resignation, draw offers
//! and client-reported terminal positions.
//!
//! The core does not verify move legality against the previous position;
//! it accepts the submitter's claim and relays it. Terminal positions
//! arrive through the explicit `report_terminal` capability, never
//! inferred from move tokens.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{clock, lifecycle, member_subs, MatchFlowService};
use crate::domain::session::{EndReason, MatchResult, SideId, TerminalKind};
use crate::domain::snapshot::SessionSnapshot;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::services::session_registry::SessionEntry;
use crate::state::app_state::AppState;
use crate::ws::protocol::ServerMsg;

impl MatchFlowService {
    /// Announce a freshly created session to both sides and start its
    /// clock engine.
    pub async fn launch(&self, state: &AppState, entry: &Arc<SessionEntry>) {
        let (snapshot, subs) = {
            let mut session = entry.lock().await;
            let reachable = [
                state.presence.is_reachable(&session.sides[0].identity.sub),
                state.presence.is_reachable(&session.sides[1].identity.sub),
            ];
            session.presence = reachable;
            (SessionSnapshot::of(&session), member_subs(&session))
        };
        for sub in &subs {
            state.presence.send_to(
                sub,
                ServerMsg::SessionStarted {
                    session: snapshot.clone(),
                },
            );
        }
        clock::spawn_clock(
            state.sessions.clone(),
            state.presence.clone(),
            state.match_config.clone(),
            entry.clone(),
        );
    }

    /// Apply a move and broadcast the applied state to BOTH sides, the
    /// submitter included, so the two ends converge on identical state.
    /// Clocks are untouched by moves; only ticks change clocks.
    pub async fn submit_move(
        &self,
        state: &AppState,
        session_id: Uuid,
        actor_sub: &str,
        from: &str,
        to: &str,
        promotion: Option<&str>,
        new_position_token: String,
    ) -> Result<(), AppError> {
        let (entry, side) = self.participant(state, session_id, actor_sub)?;
        let move_token = match promotion {
            Some(p) => format!("{from}{to}{p}"),
            None => format!("{from}{to}"),
        };

        let (payload, subs) = {
            let mut session = entry.lock().await;
            session.apply_move(
                side,
                move_token.clone(),
                new_position_token,
                OffsetDateTime::now_utc(),
            )?;
            (
                ServerMsg::MoveApplied {
                    session_id,
                    move_token,
                    position_token: session.position_token.clone(),
                    clock_a: session.clock(SideId::A),
                    clock_b: session.clock(SideId::B),
                    turn: session.turn,
                },
                member_subs(&session),
            )
        };
        for sub in &subs {
            state.presence.send_to(sub, payload.clone());
        }
        debug!(session_id = %session_id, sub = %actor_sub, "move applied");
        Ok(())
    }

    pub async fn resign(
        &self,
        state: &AppState,
        session_id: Uuid,
        actor_sub: &str,
    ) -> Result<(), AppError> {
        let (entry, side) = self.participant(state, session_id, actor_sub)?;
        let ended = {
            let mut session = entry.lock().await;
            if !session.is_active() {
                return Err(DomainError::invalid_state("session is not active").into());
            }
            lifecycle::finish_locked(
                &entry,
                &mut session,
                MatchResult::win_for(side.other()),
                EndReason::Resignation,
            )
        };
        if let Some(ended) = ended {
            lifecycle::after_finish(
                &state.sessions,
                &state.presence,
                &state.match_config,
                &entry,
                ended,
            );
        }
        Ok(())
    }

    /// Record a draw offer and tell the opponent. A standing offer from
    /// the same side is simply refreshed.
    pub async fn offer_draw(
        &self,
        state: &AppState,
        session_id: Uuid,
        actor_sub: &str,
    ) -> Result<(), AppError> {
        let (entry, side) = self.participant(state, session_id, actor_sub)?;
        let opponent_sub = {
            let mut session = entry.lock().await;
            session.offer_draw(side)?;
            session.side(side.other()).identity.sub.clone()
        };
        state
            .presence
            .send_to(&opponent_sub, ServerMsg::DrawOffered { session_id, by: side });
        Ok(())
    }

    /// Accepting a standing offer from the opponent ends the session in
    /// an agreed draw.
    pub async fn accept_draw(
        &self,
        state: &AppState,
        session_id: Uuid,
        actor_sub: &str,
    ) -> Result<(), AppError> {
        let (entry, side) = self.participant(state, session_id, actor_sub)?;
        let ended = {
            let mut session = entry.lock().await;
            session.may_accept_draw(side)?;
            lifecycle::finish_locked(
                &entry,
                &mut session,
                MatchResult::Draw,
                EndReason::Agreement,
            )
        };
        if let Some(ended) = ended {
            lifecycle::after_finish(
                &state.sessions,
                &state.presence,
                &state.match_config,
                &entry,
                ended,
            );
        }
        Ok(())
    }

    /// Client-reported terminal position. The result derives from the
    /// reported kind and the side to move before the report: that side is
    /// the one with no legal continuation.
    pub async fn report_terminal(
        &self,
        state: &AppState,
        session_id: Uuid,
        actor_sub: &str,
        kind: TerminalKind,
    ) -> Result<(), AppError> {
        let (entry, _side) = self.participant(state, session_id, actor_sub)?;
        let ended = {
            let mut session = entry.lock().await;
            if !session.is_active() {
                return Err(DomainError::invalid_state("session is not active").into());
            }
            let (result, reason) = kind.outcome(session.turn);
            lifecycle::finish_locked(&entry, &mut session, result, reason)
        };
        if let Some(ended) = ended {
            lifecycle::after_finish(
                &state.sessions,
                &state.presence,
                &state.match_config,
                &entry,
                ended,
            );
        }
        Ok(())
    }

    fn participant(
        &self,
        state: &AppState,
        session_id: Uuid,
        actor_sub: &str,
    ) -> Result<(Arc<SessionEntry>, SideId), AppError> {
        let entry = state.sessions.get(session_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Session, "unknown or purged session")
        })?;
        let side = entry
            .member_side(actor_sub)
            .ok_or_else(|| DomainError::not_eligible("not a participant in this session"))?;
        Ok((entry, side))
    }
}
