use time::OffsetDateTime;

use crate::domain::identity::{Identity, Role};
use crate::domain::pairing::{PairingMode, PairingRequest, RequestStatus};
use crate::errors::domain::DomainError;

fn coach() -> Identity {
    Identity::new("coach-1", "Avery", Role::Coach)
}

fn broadcast_request() -> PairingRequest {
    PairingRequest::new(
        coach(),
        None,
        PairingMode::Friendly,
        vec![Identity::new("learner-1", "Sam", Role::Learner)],
        OffsetDateTime::now_utc(),
    )
}

#[test]
fn pending_broadcast_is_acceptable_by_anyone_offered() {
    let request = broadcast_request();
    request.may_accept("learner-1").unwrap();
    request.may_accept("learner-2").unwrap();
}

#[test]
fn initiator_cannot_accept_own_request() {
    let request = broadcast_request();
    assert!(matches!(
        request.may_accept("coach-1"),
        Err(DomainError::NotEligible(_))
    ));
}

#[test]
fn targeted_request_rejects_other_responders() {
    let request = PairingRequest::new(
        coach(),
        Some("learner-1".to_string()),
        PairingMode::Lesson,
        vec![Identity::new("learner-1", "Sam", Role::Learner)],
        OffsetDateTime::now_utc(),
    );
    request.may_accept("learner-1").unwrap();
    assert!(matches!(
        request.may_accept("learner-2"),
        Err(DomainError::NotEligible(_))
    ));
}

#[test]
fn decliner_is_excluded_from_accepting_later() {
    let mut request = broadcast_request();
    request.declined_by.push("learner-1".to_string());
    assert!(matches!(
        request.may_accept("learner-1"),
        Err(DomainError::NotEligible(_))
    ));
    request.may_accept("learner-2").unwrap();
}

#[test]
fn resolved_request_fails_with_already_resolved() {
    for status in [
        RequestStatus::Accepted,
        RequestStatus::Declined,
        RequestStatus::Cancelled,
        RequestStatus::Unavailable,
    ] {
        let mut request = broadcast_request();
        request.status = status;
        assert!(matches!(
            request.may_accept("learner-1"),
            Err(DomainError::AlreadyResolved(_))
        ));
    }
}
