//! Reconnection sync: replay full session state on (re)connect and keep
//! the peer informed about presence transitions. Clocks and status are
//! never touched from here.

use super::MatchFlowService;
use crate::domain::snapshot::SessionSnapshot;
use crate::state::app_state::AppState;
use crate::ws::protocol::ServerMsg;

impl MatchFlowService {
    /// Called when an identity gains a connection. If it is mid-session,
    /// mark its seat present and return the snapshot to replay to the new
    /// connection only; the peer hears about it on the offline->online
    /// transition, not for every extra tab.
    pub async fn connected(
        &self,
        state: &AppState,
        sub: &str,
        came_online: bool,
    ) -> Option<SessionSnapshot> {
        let entry = state.sessions.active_entry_for(sub)?;
        let side = entry.member_side(sub)?;
        let (snapshot, peer_sub, session_id) = {
            let mut session = entry.lock().await;
            session.presence[side.index()] = true;
            (
                SessionSnapshot::of(&session),
                session.side(side.other()).identity.sub.clone(),
                session.id,
            )
        };
        if came_online {
            state.presence.send_to(
                &peer_sub,
                ServerMsg::PeerStatus {
                    session_id,
                    side,
                    online: true,
                },
            );
        }
        Some(snapshot)
    }

    /// Called when an identity's last connection goes away.
    pub async fn disconnected(&self, state: &AppState, sub: &str) {
        let Some(entry) = state.sessions.active_entry_for(sub) else {
            return;
        };
        let Some(side) = entry.member_side(sub) else {
            return;
        };
        let (peer_sub, session_id) = {
            let mut session = entry.lock().await;
            session.presence[side.index()] = false;
            (
                session.side(side.other()).identity.sub.clone(),
                session.id,
            )
        };
        state.presence.send_to(
            &peer_sub,
            ServerMsg::PeerStatus {
                session_id,
                side,
                online: false,
            },
        );
    }
}
