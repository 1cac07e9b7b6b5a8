//! Session flow integration tests: moves, resignation, draw agreement,
//! terminal reports and reconnection sync.

mod common;

use std::sync::Arc;
use std::time::Duration;

use backend::config::MatchConfig;
use backend::domain::{
    EndReason, Identity, MatchResult, PairingMode, SessionStatus, TerminalKind, TimeControl,
};
use backend::errors::ErrorCode;
use backend::services::match_flow::MatchFlowService;
use backend::services::session_registry::SessionEntry;
use backend::state::app_state::AppState;
use backend::ws::protocol::ServerMsg;
use backend::AppError;
use common::{coach, connect, drain, learner, settle};

/// Test state whose clock all but never ticks, so session-flow tests see
/// only the frames their own actions produce.
fn quiet_state() -> AppState {
    AppState::for_tests_with_config(MatchConfig {
        tick_interval: Duration::from_secs(3600),
        ..MatchConfig::default()
    })
}

async fn start_session(state: &AppState, c: &Identity, l: &Identity) -> Arc<SessionEntry> {
    let outcome = state
        .pairing
        .submit(c.clone(), PairingMode::Lesson, Some(l.sub.clone()));
    let (_request, entry) = state
        .pairing
        .accept(
            outcome.request_id,
            l,
            TimeControl { initial_secs: 300 },
        )
        .unwrap();
    MatchFlowService.launch(state, &entry).await;
    entry
}

/// The sub of whichever identity holds the turn right now.
async fn to_move(entry: &Arc<SessionEntry>) -> (String, String) {
    let session = entry.lock().await;
    let mover = session.side(session.turn).identity.sub.clone();
    let waiter = session.side(session.turn.other()).identity.sub.clone();
    (mover, waiter)
}

fn assert_conflict(err: AppError, expected: ErrorCode) {
    match err {
        AppError::Conflict { code, .. } => assert_eq!(code, expected),
        other => panic!("expected conflict {expected:?}, got {other:?}"),
    }
}

#[actix_web::test]
async fn launch_broadcasts_identical_snapshots_to_both_sides() {
    let state = quiet_state();
    let c = coach("s1");
    let l = learner("s1");
    let (_, c_inbox) = connect(&state, &c);
    let (_, l_inbox) = connect(&state, &l);

    start_session(&state, &c, &l).await;
    settle().await;

    let c_frames = drain(&c_inbox);
    let l_frames = drain(&l_inbox);
    let snapshot_of = |frames: &[ServerMsg]| match frames {
        [ServerMsg::SessionStarted { session }] => session.clone(),
        other => panic!("expected a single session_started, got {other:?}"),
    };
    let c_snap = snapshot_of(&c_frames);
    let l_snap = snapshot_of(&l_frames);
    assert_eq!(c_snap, l_snap);
    assert!(c_snap.side_a.online && c_snap.side_b.online);
    assert_eq!(c_snap.status, SessionStatus::Active);
}

#[actix_web::test]
async fn moves_broadcast_to_both_sides_and_flip_the_turn() {
    let state = quiet_state();
    let c = coach("s2");
    let l = learner("s2");
    let (_, c_inbox) = connect(&state, &c);
    let (_, l_inbox) = connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;
    settle().await;
    drain(&c_inbox);
    drain(&l_inbox);

    let (mover, waiter) = to_move(&entry).await;
    let flow = MatchFlowService;

    // Out of turn first: rejected, nothing broadcast.
    let err = flow
        .submit_move(
            &state,
            entry.id(),
            &waiter,
            "e7",
            "e5",
            None,
            "pos-x".to_string(),
        )
        .await
        .unwrap_err();
    assert_conflict(err, ErrorCode::NotYourTurn);

    flow.submit_move(
        &state,
        entry.id(),
        &mover,
        "e2",
        "e4",
        None,
        "pos-after-e4".to_string(),
    )
    .await
    .unwrap();
    settle().await;

    let expect_move = |frames: Vec<ServerMsg>| match frames.as_slice() {
        [ServerMsg::MoveApplied {
            move_token,
            position_token,
            clock_a,
            clock_b,
            turn,
            ..
        }] => {
            assert_eq!(move_token, "e2e4");
            assert_eq!(position_token, "pos-after-e4");
            assert_eq!((*clock_a, *clock_b), (300, 300));
            *turn
        }
        other => panic!("expected a single move_applied, got {other:?}"),
    };
    // The submitter and the opponent receive the same applied state.
    let turn_seen_by_c = expect_move(drain(&c_inbox));
    let turn_seen_by_l = expect_move(drain(&l_inbox));
    assert_eq!(turn_seen_by_c, turn_seen_by_l);

    let session = entry.lock().await;
    assert_eq!(session.move_log.len(), 1);
    assert_eq!(session.side(session.turn).identity.sub, waiter);
}

#[actix_web::test]
async fn promotion_is_folded_into_the_move_token() {
    let state = quiet_state();
    let c = coach("s3");
    let l = learner("s3");
    connect(&state, &c);
    let (_, l_inbox) = connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;
    settle().await;
    drain(&l_inbox);

    let (mover, _) = to_move(&entry).await;
    MatchFlowService
        .submit_move(
            &state,
            entry.id(),
            &mover,
            "e7",
            "e8",
            Some("q"),
            "pos-promo".to_string(),
        )
        .await
        .unwrap();

    let session = entry.lock().await;
    assert_eq!(session.move_log, vec!["e7e8q".to_string()]);
}

#[actix_web::test]
async fn strangers_and_unknown_sessions_are_rejected() {
    let state = quiet_state();
    let c = coach("s4");
    let l = learner("s4");
    connect(&state, &c);
    connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;

    let flow = MatchFlowService;
    let err = flow
        .submit_move(
            &state,
            entry.id(),
            "someone-else",
            "e2",
            "e4",
            None,
            "pos".to_string(),
        )
        .await
        .unwrap_err();
    assert_conflict(err, ErrorCode::NotEligible);

    let err = flow
        .resign(&state, uuid::Uuid::new_v4(), &c.sub)
        .await
        .unwrap_err();
    match err {
        AppError::NotFound { code, .. } => assert_eq!(code, ErrorCode::SessionNotFound),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[actix_web::test]
async fn resignation_scores_for_the_opponent() {
    let state = quiet_state();
    let c = coach("s5");
    let l = learner("s5");
    let (_, c_inbox) = connect(&state, &c);
    let (_, l_inbox) = connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;
    settle().await;
    drain(&c_inbox);
    drain(&l_inbox);

    let flow = MatchFlowService;
    let learner_side = entry.member_side(&l.sub).unwrap();
    flow.resign(&state, entry.id(), &l.sub).await.unwrap();
    settle().await;

    for inbox in [&c_inbox, &l_inbox] {
        let frames = drain(inbox);
        match frames.as_slice() {
            [ServerMsg::SessionEnded { result, reason, .. }] => {
                assert_eq!(*result, MatchResult::win_for(learner_side.other()));
                assert_eq!(*reason, EndReason::Resignation);
            }
            other => panic!("expected a single session_ended, got {other:?}"),
        }
    }

    // Finished members are free again for pairing.
    assert!(!state.sessions.is_busy(&c.sub));
    assert!(!state.sessions.is_busy(&l.sub));

    // Every further mutation on the session is InvalidState.
    let err = flow.resign(&state, entry.id(), &c.sub).await.unwrap_err();
    assert_conflict(err, ErrorCode::InvalidState);
    let err = flow
        .submit_move(&state, entry.id(), &c.sub, "e2", "e4", None, "pos".to_string())
        .await
        .unwrap_err();
    assert_conflict(err, ErrorCode::InvalidState);
}

#[actix_web::test]
async fn draw_agreement_finishes_the_session() {
    let state = quiet_state();
    let c = coach("s6");
    let l = learner("s6");
    let (_, c_inbox) = connect(&state, &c);
    let (_, l_inbox) = connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;
    settle().await;
    drain(&c_inbox);
    drain(&l_inbox);

    let flow = MatchFlowService;

    // Accepting with no standing offer is invalid.
    let err = flow.accept_draw(&state, entry.id(), &l.sub).await.unwrap_err();
    assert_conflict(err, ErrorCode::InvalidState);

    let coach_side = entry.member_side(&c.sub).unwrap();
    flow.offer_draw(&state, entry.id(), &c.sub).await.unwrap();
    settle().await;

    // Only the opponent hears about the offer.
    assert!(drain(&c_inbox).is_empty());
    match drain(&l_inbox).as_slice() {
        [ServerMsg::DrawOffered { by, .. }] => assert_eq!(*by, coach_side),
        other => panic!("expected a single draw_offered, got {other:?}"),
    }

    flow.accept_draw(&state, entry.id(), &l.sub).await.unwrap();
    settle().await;

    for inbox in [&c_inbox, &l_inbox] {
        match drain(inbox).as_slice() {
            [ServerMsg::SessionEnded { result, reason, .. }] => {
                assert_eq!(*result, MatchResult::Draw);
                assert_eq!(*reason, EndReason::Agreement);
            }
            other => panic!("expected a single session_ended, got {other:?}"),
        }
    }

    let err = flow
        .submit_move(&state, entry.id(), &c.sub, "e2", "e4", None, "pos".to_string())
        .await
        .unwrap_err();
    assert_conflict(err, ErrorCode::InvalidState);
}

#[actix_web::test]
async fn terminal_report_scores_against_the_side_to_move() {
    let state = quiet_state();
    let c = coach("s7");
    let l = learner("s7");
    let (_, c_inbox) = connect(&state, &c);
    connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;
    settle().await;
    drain(&c_inbox);

    let flow = MatchFlowService;
    let (mover, _) = to_move(&entry).await;
    flow.submit_move(
        &state,
        entry.id(),
        &mover,
        "d1",
        "h5",
        None,
        "pos-mate".to_string(),
    )
    .await
    .unwrap();

    // The side to move now is the mated one; the mover wins.
    let mover_side = entry.member_side(&mover).unwrap();
    flow.report_terminal(&state, entry.id(), &l.sub, TerminalKind::Checkmate)
        .await
        .unwrap();

    let session = entry.lock().await;
    assert_eq!(session.status, SessionStatus::Finished);
    assert_eq!(session.result, Some(MatchResult::win_for(mover_side)));
    assert_eq!(session.reason, Some(EndReason::Checkmate));
}

#[actix_web::test]
async fn reconnect_replays_the_exact_session_state() {
    let state = quiet_state();
    let c = coach("s8");
    let l = learner("s8");
    let (_, c_inbox) = connect(&state, &c);
    let (l_conn, _) = connect(&state, &l);
    let entry = start_session(&state, &c, &l).await;
    settle().await;

    let flow = MatchFlowService;
    let (mover, _) = to_move(&entry).await;
    flow.submit_move(
        &state,
        entry.id(),
        &mover,
        "e2",
        "e4",
        None,
        "pos-after-e4".to_string(),
    )
    .await
    .unwrap();

    let before = {
        let session = entry.lock().await;
        (
            session.move_log.clone(),
            session.position_token.clone(),
            session.clocks,
            session.turn,
            session.status,
        )
    };
    drain(&c_inbox);

    // Last connection drops: seat goes offline, the peer is told.
    let (_, went_offline) = state.presence.unregister(l_conn).unwrap();
    assert!(went_offline);
    assert!(state.presence.connections_of(&l.sub).is_empty());
    assert!(!state.presence.is_reachable(&l.sub));
    // Dropping an already-absent connection is a no-op, not an error.
    assert!(state.presence.unregister(l_conn).is_none());
    flow.disconnected(&state, &l.sub).await;
    settle().await;
    let learner_side = entry.member_side(&l.sub).unwrap();
    match drain(&c_inbox).as_slice() {
        [ServerMsg::PeerStatus { side, online, .. }] => {
            assert_eq!(*side, learner_side);
            assert!(!online);
        }
        other => panic!("expected a single peer_status, got {other:?}"),
    }
    assert!(!entry.lock().await.presence[learner_side.index()]);

    // Reconnect: the snapshot replayed to the new connection matches the
    // state before the drop, and the peer hears the side is back.
    let (_, _l_inbox2) = connect(&state, &l);
    let snapshot = flow.connected(&state, &l.sub, true).await.unwrap();
    assert_eq!(snapshot.move_log, before.0);
    assert_eq!(snapshot.position_token, before.1);
    assert_eq!(
        (snapshot.side_a.clock_secs, snapshot.side_b.clock_secs),
        (before.2[0], before.2[1])
    );
    assert_eq!(snapshot.turn, before.3);
    assert_eq!(snapshot.status, before.4);

    settle().await;
    match drain(&c_inbox).as_slice() {
        [ServerMsg::PeerStatus { side, online, .. }] => {
            assert_eq!(*side, learner_side);
            assert!(online);
        }
        other => panic!("expected a single peer_status, got {other:?}"),
    }

    // A second tab is not an offline->online transition for the peer.
    let (_, _extra) = connect(&state, &l);
    flow.connected(&state, &l.sub, false).await.unwrap();
    settle().await;
    assert!(drain(&c_inbox).is_empty());
}
