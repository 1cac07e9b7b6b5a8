//! Clock engine: one ticking task per active session.
//!
//! The task owns nothing but the session id; each tick re-resolves the
//! entry and takes the serialization lock, so a tick and a concurrent
//! move can never interleave. Exactly one side's clock decreases per
//! tick, selected by the turn. Disconnection does not pause the clock
//! unless `MatchConfig::clock_runs_while_disconnected` says otherwise.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{lifecycle, member_subs};
use crate::config::MatchConfig;
use crate::domain::session::{ClockTick, EndReason, MatchResult, SideId};
use crate::services::presence::PresenceDirectory;
use crate::services::session_registry::{SessionEntry, SessionRegistry};
use crate::ws::protocol::ServerMsg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// The session finished or disappeared; the ticking task exits.
    Stopped,
}

/// Start the ticking task for a freshly created session and park its
/// handle on the entry so `finish` can stop it.
pub fn spawn_clock(
    sessions: Arc<SessionRegistry>,
    presence: Arc<PresenceDirectory>,
    config: MatchConfig,
    entry: Arc<SessionEntry>,
) {
    let session_id = entry.id();
    let handle = tokio::spawn(run_clock(sessions, presence, config, session_id));
    entry.set_clock_handle(handle);
    debug!(session_id = %session_id, "clock engine started");
}

async fn run_clock(
    sessions: Arc<SessionRegistry>,
    presence: Arc<PresenceDirectory>,
    config: MatchConfig,
    session_id: Uuid,
) {
    let mut ticker = tokio::time::interval(config.tick_interval);
    // Late ticks fire as soon as possible but are never bunched up:
    // a tick is neither skipped nor duplicated under load.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately; consume it so the
    // clock only starts decrementing one full unit after creation.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if tick_once(&sessions, &presence, &config, session_id).await == TickOutcome::Stopped {
            break;
        }
    }
    debug!(session_id = %session_id, "clock engine stopped");
}

/// Advance one session's clock by one unit. The ticking task calls this
/// once per interval; tests call it directly to move time forward
/// deterministically.
pub async fn tick_once(
    sessions: &Arc<SessionRegistry>,
    presence: &Arc<PresenceDirectory>,
    config: &MatchConfig,
    session_id: Uuid,
) -> TickOutcome {
    let Some(entry) = sessions.get(session_id) else {
        // A tick without a session record is an internal fault; favor
        // self-correction over crashing a live service.
        warn!(session_id = %session_id, "clock tick for a session no longer in the registry");
        return TickOutcome::Stopped;
    };

    let mut session = entry.lock().await;
    if !session.is_active() {
        return TickOutcome::Stopped;
    }
    if !config.clock_runs_while_disconnected && !session.presence[session.turn.index()] {
        // Configured to hold the clock while the side to move is offline.
        return TickOutcome::Running;
    }

    match session.tick() {
        ClockTick::Running => {
            let payload = ServerMsg::ClockUpdate {
                session_id,
                clock_a: session.clock(SideId::A),
                clock_b: session.clock(SideId::B),
                turn: session.turn,
            };
            let subs = member_subs(&session);
            drop(session);
            for sub in &subs {
                presence.send_to(sub, payload.clone());
            }
            TickOutcome::Running
        }
        ClockTick::Flagged(side) => {
            info!(session_id = %session_id, flagged = ?side, "flag fell");
            let ended = lifecycle::finish_locked(
                &entry,
                &mut session,
                MatchResult::win_for(side.other()),
                EndReason::Timeout,
            );
            drop(session);
            if let Some(ended) = ended {
                lifecycle::after_finish(sessions, presence, config, &entry, ended);
            }
            TickOutcome::Stopped
        }
    }
}
