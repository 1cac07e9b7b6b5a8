//! Presence directory: who is connected, on which connections.
//!
//! Maintains a bidirectional mapping between identities and their live
//! websocket connections so that dropping any one connection cannot
//! corrupt lookups for the identity's others. All operations are
//! idempotent; unregistering an unknown connection is a no-op.
//!
//! Delivery goes through actor recipients and `do_send`, which enqueues
//! without blocking: a slow or closed peer can never stall the state
//! mutation that triggered a broadcast.

use actix::prelude::*;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::ws::protocol::ServerMsg;

/// Outbound server frame routed to one connection's actor.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct ServerPush(pub ServerMsg);

struct IdentityPresence {
    identity: Identity,
    connections: DashMap<Uuid, Recipient<ServerPush>>,
}

#[derive(Default)]
pub struct PresenceDirectory {
    identities: DashMap<String, IdentityPresence>,
    /// Reverse map so unregister needs only the connection id.
    connections: DashMap<Uuid, String>,
}

impl PresenceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection. Returns `true` when this is the
    /// identity's first live connection (it just came online).
    pub fn register(
        &self,
        identity: Identity,
        conn_id: Uuid,
        recipient: Recipient<ServerPush>,
    ) -> bool {
        let sub = identity.sub.clone();
        self.connections.insert(conn_id, sub.clone());
        let entry = self
            .identities
            .entry(sub.clone())
            .or_insert_with(|| IdentityPresence {
                identity,
                connections: DashMap::new(),
            });
        let came_online = entry.connections.is_empty();
        entry.connections.insert(conn_id, recipient);
        debug!(sub = %sub, conn_id = %conn_id, came_online, "connection registered");
        came_online
    }

    /// Drop a connection. Returns the identity key and whether that was
    /// its last live connection; `None` if the connection was unknown.
    pub fn unregister(&self, conn_id: Uuid) -> Option<(String, bool)> {
        let (_, sub) = self.connections.remove(&conn_id)?;
        let went_offline = match self.identities.get(&sub) {
            Some(entry) => {
                entry.connections.remove(&conn_id);
                entry.connections.is_empty()
            }
            None => false,
        };
        if went_offline {
            self.identities
                .remove_if(&sub, |_, entry| entry.connections.is_empty());
        }
        debug!(sub = %sub, conn_id = %conn_id, went_offline, "connection unregistered");
        Some((sub, went_offline))
    }

    /// The ids of every live connection an identity currently holds.
    pub fn connections_of(&self, sub: &str) -> Vec<Uuid> {
        self.identities
            .get(sub)
            .map(|entry| entry.connections.iter().map(|conn| *conn.key()).collect())
            .unwrap_or_default()
    }

    pub fn is_reachable(&self, sub: &str) -> bool {
        self.identities
            .get(sub)
            .map(|entry| !entry.connections.is_empty())
            .unwrap_or(false)
    }

    /// The identity behind a reachable key, if any.
    pub fn identity_of(&self, sub: &str) -> Option<Identity> {
        self.identities
            .get(sub)
            .filter(|entry| !entry.connections.is_empty())
            .map(|entry| entry.identity.clone())
    }

    /// Every identity with at least one live connection.
    pub fn reachable_identities(&self) -> Vec<Identity> {
        self.identities
            .iter()
            .filter(|entry| !entry.connections.is_empty())
            .map(|entry| entry.identity.clone())
            .collect()
    }

    /// Fan a frame out to all of one identity's connections. Best-effort:
    /// a full or closed mailbox drops the frame, reconnection sync is the
    /// recovery path.
    pub fn send_to(&self, sub: &str, msg: ServerMsg) {
        if let Some(entry) = self.identities.get(sub) {
            for conn in entry.connections.iter() {
                conn.value().do_send(ServerPush(msg.clone()));
            }
        }
    }
}
