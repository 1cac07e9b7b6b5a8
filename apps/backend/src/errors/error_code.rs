//! Error codes for the match-coordination API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses and websocket error events.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Authentication required
    Unauthorized,
    /// Missing or malformed Bearer token
    UnauthorizedMissingBearer,
    /// Access denied
    Forbidden,

    // Request Validation
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Resource Not Found
    /// Pairing request not found
    RequestNotFound,
    /// Session not found (or already purged)
    SessionNotFound,
    /// General not found error
    NotFound,

    // Coordination Conflicts
    /// Participant is busy, unreachable or not the addressee
    NotEligible,
    /// Race loser on accept/decline/finish
    AlreadyResolved,
    /// Move submitted out of turn
    NotYourTurn,
    /// Operation attempted on a session in the wrong state
    InvalidState,

    // Infrastructure
    /// Internal server error
    InternalError,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::RequestNotFound => "REQUEST_NOT_FOUND",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::NotEligible => "NOT_ELIGIBLE",
            ErrorCode::AlreadyResolved => "ALREADY_RESOLVED",
            ErrorCode::NotYourTurn => "NOT_YOUR_TURN",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }

    /// All variants, for exhaustiveness checks in tests.
    pub const ALL: [ErrorCode; 14] = [
        ErrorCode::Unauthorized,
        ErrorCode::UnauthorizedMissingBearer,
        ErrorCode::Forbidden,
        ErrorCode::ValidationError,
        ErrorCode::BadRequest,
        ErrorCode::RequestNotFound,
        ErrorCode::SessionNotFound,
        ErrorCode::NotFound,
        ErrorCode::NotEligible,
        ErrorCode::AlreadyResolved,
        ErrorCode::NotYourTurn,
        ErrorCode::InvalidState,
        ErrorCode::InternalError,
        ErrorCode::ConfigError,
    ];
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
