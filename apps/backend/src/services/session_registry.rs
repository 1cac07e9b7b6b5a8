//! The authoritative table of in-progress and recently finished sessions.
//!
//! Each entry carries the per-session serialization mutex: every mutating
//! operation on a session (moves, resignations, draw events, terminal
//! reports, clock ticks) goes through [`SessionEntry::lock`], so same-
//! session operations execute one at a time in arrival order (the tokio
//! mutex is FIFO-fair) while different sessions proceed fully in
//! parallel.
//!
//! Membership and finished-ness are mirrored outside the mutex so the
//! pairing exchange's cross-cutting busy scan never has to queue behind
//! session traffic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex as SyncMutex;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::domain::pairing::PairingMode;
use crate::domain::session::{MatchSession, SideId, TimeControl};
use crate::errors::domain::DomainError;

#[derive(Debug)]
pub struct SessionEntry {
    id: Uuid,
    side_subs: [String; 2],
    finished: AtomicBool,
    state: Mutex<MatchSession>,
    clock_handle: SyncMutex<Option<JoinHandle<()>>>,
}

impl SessionEntry {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enter this session's serialization queue.
    pub async fn lock(&self) -> MutexGuard<'_, MatchSession> {
        self.state.lock().await
    }

    pub fn member_side(&self, sub: &str) -> Option<SideId> {
        if self.side_subs[0] == sub {
            Some(SideId::A)
        } else if self.side_subs[1] == sub {
            Some(SideId::B)
        } else {
            None
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Mirror the terminal transition for lock-free busy scans. Call only
    /// while holding the state lock, right after `MatchSession::finish`.
    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub(crate) fn set_clock_handle(&self, handle: JoinHandle<()>) {
        *self.clock_handle.lock() = Some(handle);
    }

    pub(crate) fn take_clock_handle(&self) -> Option<JoinHandle<()>> {
        self.clock_handle.lock().take()
    }
}

pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<SessionEntry>>,
    /// Serializes the busy-scan-then-insert step of `create` so two
    /// accepts naming the same participant through different requests
    /// cannot both win. Everything else on this registry is lock-free.
    create_lock: SyncMutex<()>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            create_lock: SyncMutex::new(()),
        }
    }

    /// Create an active session between two free participants. Colors are
    /// a fair coin flip; the side dealt white moves first and its clock
    /// runs first.
    pub fn create(
        &self,
        side_a: Identity,
        side_b: Identity,
        mode: PairingMode,
        time_control: TimeControl,
        now: OffsetDateTime,
    ) -> Result<Arc<SessionEntry>, DomainError> {
        let _guard = self.create_lock.lock();
        if self.is_busy(&side_a.sub) {
            return Err(DomainError::not_eligible(
                "initiator is already in an active session",
            ));
        }
        if self.is_busy(&side_b.sub) {
            return Err(DomainError::not_eligible(
                "responder is already in an active session",
            ));
        }

        let id = Uuid::new_v4();
        let white = if rand::random::<bool>() {
            SideId::A
        } else {
            SideId::B
        };
        let side_subs = [side_a.sub.clone(), side_b.sub.clone()];
        let session = MatchSession::new(id, side_a, side_b, white, mode, time_control, now);
        let entry = Arc::new(SessionEntry {
            id,
            side_subs,
            finished: AtomicBool::new(false),
            state: Mutex::new(session),
            clock_handle: SyncMutex::new(None),
        });
        self.sessions.insert(id, entry.clone());
        info!(session_id = %id, "session created");
        Ok(entry)
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<SessionEntry>> {
        self.sessions.get(&id).map(|entry| entry.clone())
    }

    /// The one cross-cutting query every pairing operation depends on:
    /// is this identity a member of any active session?
    pub fn is_busy(&self, sub: &str) -> bool {
        self.active_entry_for(sub).is_some()
    }

    pub fn active_entry_for(&self, sub: &str) -> Option<Arc<SessionEntry>> {
        self.sessions
            .iter()
            .find(|entry| !entry.is_finished() && entry.member_side(sub).is_some())
            .map(|entry| entry.clone())
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| !entry.is_finished())
            .count()
    }

    /// Purge a session. Its id is gone permanently afterwards; callers
    /// treat "not found" as terminal.
    pub fn remove(&self, id: Uuid) -> Option<Arc<SessionEntry>> {
        self.sessions.remove(&id).map(|(_, entry)| entry)
    }
}
