//! Wire-facing full-state view of a session.
//!
//! One snapshot carries every field a client needs to rebuild its UI from
//! scratch; it is what `session_started`, `session_resume` and the REST
//! lookup all return, so a reconnecting side ends up byte-identical with
//! its peer.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::identity::Role;
use crate::domain::pairing::PairingMode;
use crate::domain::session::{
    Color, EndReason, MatchResult, MatchSession, SessionStatus, SideId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideView {
    pub sub: String,
    pub display_name: String,
    pub role: Role,
    pub color: Color,
    pub clock_secs: u32,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub side_a: SideView,
    pub side_b: SideView,
    pub mode: PairingMode,
    pub position_token: String,
    pub move_log: Vec<String>,
    pub turn: SideId,
    pub status: SessionStatus,
    pub result: Option<MatchResult>,
    pub reason: Option<EndReason>,
    pub draw_offer: Option<SideId>,
    pub started_at: String,
    pub last_move_at: Option<String>,
}

impl SessionSnapshot {
    pub fn of(session: &MatchSession) -> Self {
        let view = |id: SideId| {
            let side = session.side(id);
            SideView {
                sub: side.identity.sub.clone(),
                display_name: side.identity.display_name.clone(),
                role: side.identity.role,
                color: side.color,
                clock_secs: session.clock(id),
                online: session.presence[id.index()],
            }
        };
        Self {
            session_id: session.id,
            side_a: view(SideId::A),
            side_b: view(SideId::B),
            mode: session.mode,
            position_token: session.position_token.clone(),
            move_log: session.move_log.clone(),
            turn: session.turn,
            status: session.status,
            result: session.result,
            reason: session.reason,
            draw_offer: session.draw_offer,
            started_at: rfc3339(session.started_at),
            last_move_at: session.last_move_at.map(rfc3339),
        }
    }
}

fn rfc3339(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string())
}
