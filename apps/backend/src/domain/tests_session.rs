use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::identity::{Identity, Role};
use crate::domain::pairing::PairingMode;
use crate::domain::session::{
    ClockTick, Color, EndReason, MatchResult, MatchSession, SessionStatus, SideId, TerminalKind,
    TimeControl, START_POSITION,
};
use crate::errors::domain::DomainError;

fn session_with(white: SideId, initial_secs: u32) -> MatchSession {
    MatchSession::new(
        Uuid::new_v4(),
        Identity::new("coach-1", "Avery", Role::Coach),
        Identity::new("learner-1", "Sam", Role::Learner),
        white,
        PairingMode::Lesson,
        TimeControl { initial_secs },
        OffsetDateTime::now_utc(),
    )
}

fn session() -> MatchSession {
    session_with(SideId::A, 300)
}

#[test]
fn new_session_starts_with_white_to_move() {
    let s = session_with(SideId::B, 600);
    assert_eq!(s.status, SessionStatus::Active);
    assert_eq!(s.turn, SideId::B);
    assert_eq!(s.side(SideId::B).color, Color::White);
    assert_eq!(s.side(SideId::A).color, Color::Black);
    assert_eq!(s.clocks, [600, 600]);
    assert_eq!(s.position_token, START_POSITION);
    assert!(s.move_log.is_empty());
    assert!(s.turn_matches_parity());
}

#[test]
fn side_of_resolves_members_only() {
    let s = session();
    assert_eq!(s.side_of("coach-1"), Some(SideId::A));
    assert_eq!(s.side_of("learner-1"), Some(SideId::B));
    assert_eq!(s.side_of("someone-else"), None);
}

#[test]
fn move_flips_turn_and_leaves_clocks_alone() {
    let mut s = session();
    s.apply_move(
        SideId::A,
        "e2e4".to_string(),
        "pos-after-e4".to_string(),
        OffsetDateTime::now_utc(),
    )
    .unwrap();

    assert_eq!(s.move_log, vec!["e2e4".to_string()]);
    assert_eq!(s.position_token, "pos-after-e4");
    assert_eq!(s.turn, SideId::B);
    assert_eq!(s.clocks, [300, 300]);
    assert!(s.last_move_at.is_some());
    assert!(s.turn_matches_parity());
}

#[test]
fn out_of_turn_move_is_rejected() {
    let mut s = session();
    let err = s
        .apply_move(
            SideId::B,
            "e7e5".to_string(),
            "pos".to_string(),
            OffsetDateTime::now_utc(),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::NotYourTurn(_)));
    assert!(s.move_log.is_empty());
    assert_eq!(s.turn, SideId::A);
}

#[test]
fn move_on_finished_session_is_rejected() {
    let mut s = session();
    s.finish(MatchResult::SideA, EndReason::Resignation);
    let err = s
        .apply_move(
            SideId::A,
            "e2e4".to_string(),
            "pos".to_string(),
            OffsetDateTime::now_utc(),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[test]
fn tick_decrements_only_the_side_to_move() {
    let mut s = session_with(SideId::A, 5);
    assert_eq!(s.tick(), ClockTick::Running);
    assert_eq!(s.clocks, [4, 5]);

    // Flip the turn; the other clock runs now.
    s.apply_move(
        SideId::A,
        "e2e4".to_string(),
        "pos".to_string(),
        OffsetDateTime::now_utc(),
    )
    .unwrap();
    assert_eq!(s.tick(), ClockTick::Running);
    assert_eq!(s.clocks, [4, 4]);
}

#[test]
fn tick_flags_at_zero_and_floors() {
    let mut s = session_with(SideId::A, 1);
    assert_eq!(s.tick(), ClockTick::Flagged(SideId::A));
    assert_eq!(s.clocks, [0, 1]);
}

#[test]
fn finish_is_idempotent_and_first_result_stands() {
    let mut s = session();
    assert!(s.finish(MatchResult::SideA, EndReason::Resignation));
    assert!(!s.finish(MatchResult::SideB, EndReason::Timeout));

    assert_eq!(s.status, SessionStatus::Finished);
    assert_eq!(s.result, Some(MatchResult::SideA));
    assert_eq!(s.reason, Some(EndReason::Resignation));
}

#[test]
fn draw_offer_and_acceptance() {
    let mut s = session();
    s.offer_draw(SideId::A).unwrap();
    assert_eq!(s.draw_offer, Some(SideId::A));

    // The offerer cannot accept their own offer.
    assert!(matches!(
        s.may_accept_draw(SideId::A),
        Err(DomainError::InvalidState(_))
    ));
    // The opponent can.
    s.may_accept_draw(SideId::B).unwrap();
}

#[test]
fn accepting_without_a_standing_offer_is_rejected() {
    let s = session();
    assert!(matches!(
        s.may_accept_draw(SideId::B),
        Err(DomainError::InvalidState(_))
    ));
}

#[test]
fn finish_clears_the_draw_offer() {
    let mut s = session();
    s.offer_draw(SideId::B).unwrap();
    s.finish(MatchResult::Draw, EndReason::Agreement);
    assert_eq!(s.draw_offer, None);
}

#[test]
fn terminal_kinds_score_against_the_side_to_move() {
    assert_eq!(
        TerminalKind::Checkmate.outcome(SideId::B),
        (MatchResult::SideA, EndReason::Checkmate)
    );
    assert_eq!(
        TerminalKind::Checkmate.outcome(SideId::A),
        (MatchResult::SideB, EndReason::Checkmate)
    );
    assert_eq!(
        TerminalKind::Stalemate.outcome(SideId::A),
        (MatchResult::Draw, EndReason::Stalemate)
    );
    assert_eq!(
        TerminalKind::ThreefoldRepetition.outcome(SideId::B),
        (MatchResult::Draw, EndReason::ThreefoldRepetition)
    );
}
