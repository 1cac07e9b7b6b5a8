//! Terminal transition, result broadcast and bounded-retention purge.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use super::member_subs;
use crate::config::MatchConfig;
use crate::domain::session::{EndReason, MatchResult, MatchSession};
use crate::services::presence::PresenceDirectory;
use crate::services::session_registry::{SessionEntry, SessionRegistry};
use crate::ws::protocol::ServerMsg;

/// What to broadcast once the lock is released.
pub(crate) struct Ended {
    pub payload: ServerMsg,
    pub subs: [String; 2],
}

/// Perform the one-shot `Active -> Finished` transition while holding the
/// session lock. Returns `None` when the session already finished: the
/// first result stands and duplicate triggers (a flag fall racing a
/// resignation) degrade to no-ops.
pub(crate) fn finish_locked(
    entry: &SessionEntry,
    session: &mut MatchSession,
    result: MatchResult,
    reason: EndReason,
) -> Option<Ended> {
    if !session.finish(result, reason) {
        return None;
    }
    entry.mark_finished();
    info!(session_id = %session.id, ?result, ?reason, "session finished");
    Some(Ended {
        payload: ServerMsg::SessionEnded {
            session_id: session.id,
            result,
            reason,
        },
        subs: member_subs(session),
    })
}

/// Post-transition duties, called with the session lock released: stop
/// the clock, tell both sides, and schedule the retention purge.
pub(crate) fn after_finish(
    sessions: &Arc<SessionRegistry>,
    presence: &Arc<PresenceDirectory>,
    config: &MatchConfig,
    entry: &Arc<SessionEntry>,
    ended: Ended,
) {
    if let Some(handle) = entry.take_clock_handle() {
        handle.abort();
    }
    for sub in &ended.subs {
        presence.send_to(sub, ended.payload.clone());
    }
    schedule_purge(sessions.clone(), entry.id(), config.retention);
}

/// Finished sessions stay queryable for the retention window, then the
/// id is gone permanently.
fn schedule_purge(sessions: Arc<SessionRegistry>, session_id: Uuid, retention: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(retention).await;
        if sessions.remove(session_id).is_some() {
            info!(session_id = %session_id, "finished session purged");
        }
    });
}
