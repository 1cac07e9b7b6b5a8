//! Domain-level error type used across the coordination services.
//!
//! This error type is HTTP- and transport-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Request,
    Session,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or business rule violation
    Validation(String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Participant is busy, unreachable or not the addressee
    NotEligible(String),
    /// Race loser: the request or session was resolved first by someone else
    AlreadyResolved(String),
    /// Move submitted by the side not holding the turn
    NotYourTurn(String),
    /// Operation attempted on a session in the wrong state
    InvalidState(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(d) => write!(f, "validation error: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::NotEligible(d) => write!(f, "not eligible: {d}"),
            DomainError::AlreadyResolved(d) => write!(f, "already resolved: {d}"),
            DomainError::NotYourTurn(d) => write!(f, "not your turn: {d}"),
            DomainError::InvalidState(d) => write!(f, "invalid state: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn not_eligible(detail: impl Into<String>) -> Self {
        Self::NotEligible(detail.into())
    }
    pub fn already_resolved(detail: impl Into<String>) -> Self {
        Self::AlreadyResolved(detail.into())
    }
    pub fn not_your_turn(detail: impl Into<String>) -> Self {
        Self::NotYourTurn(detail.into())
    }
    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::InvalidState(detail.into())
    }
}
