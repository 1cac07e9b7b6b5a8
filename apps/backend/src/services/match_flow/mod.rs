//! Match flow orchestration - the concurrency shell around the pure
//! session rules in `domain::session`.
//!
//! Every mutating path in here takes the session's serialization lock
//! first, computes its broadcast payloads while holding it, and sends
//! only after releasing it. Delivery is best-effort; a send failure never
//! rolls back the mutation that preceded it.

mod clock;
mod lifecycle;
mod player_actions;
mod sync;

pub use clock::{spawn_clock, tick_once, TickOutcome};

use crate::domain::session::MatchSession;

/// Match flow service - stateless; all shared state lives in `AppState`.
#[derive(Default)]
pub struct MatchFlowService;

pub(crate) fn member_subs(session: &MatchSession) -> [String; 2] {
    [
        session.sides[0].identity.sub.clone(),
        session.sides[1].identity.sub.clone(),
    ]
}
