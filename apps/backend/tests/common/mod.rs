#![allow(dead_code)]

//! Shared helpers for coordination integration tests: in-process
//! "connections" that collect everything the server pushes at them.

use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use parking_lot::Mutex;
use uuid::Uuid;

use backend::domain::{Identity, Role};
use backend::services::presence::ServerPush;
use backend::state::app_state::AppState;
use backend::ws::protocol::ServerMsg;
use backend_test_support::unique_helpers::unique_str;

pub type Inbox = Arc<Mutex<Vec<ServerMsg>>>;

/// Stand-in for a websocket session actor: records every pushed frame.
pub struct Collector {
    inbox: Inbox,
}

impl Actor for Collector {
    type Context = Context<Self>;
}

impl Handler<ServerPush> for Collector {
    type Result = ();

    fn handle(&mut self, msg: ServerPush, _ctx: &mut Context<Self>) {
        self.inbox.lock().push(msg.0);
    }
}

/// Register a live "connection" for the identity and return its id plus
/// the inbox of frames pushed to it.
pub fn connect(state: &AppState, identity: &Identity) -> (Uuid, Inbox) {
    backend_test_support::test_logging::init();
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let collector = Collector {
        inbox: inbox.clone(),
    };
    let addr = collector.start();
    let conn_id = Uuid::new_v4();
    state
        .presence
        .register(identity.clone(), conn_id, addr.recipient());
    (conn_id, inbox)
}

pub fn coach(tag: &str) -> Identity {
    Identity::new(unique_str(&format!("coach-{tag}")), "Avery", Role::Coach)
}

pub fn learner(tag: &str) -> Identity {
    Identity::new(unique_str(&format!("learner-{tag}")), "Sam", Role::Learner)
}

/// Let queued actor mailbox deliveries drain.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

pub fn drain(inbox: &Inbox) -> Vec<ServerMsg> {
    std::mem::take(&mut *inbox.lock())
}

pub fn count_matching(inbox: &Inbox, pred: impl Fn(&ServerMsg) -> bool) -> usize {
    inbox.lock().iter().filter(|m| pred(m)).count()
}
