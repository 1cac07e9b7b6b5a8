use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::domain::{DomainError, NotFoundKind};
use crate::errors::ErrorCode;
use crate::trace_ctx;

/// RFC 7807 style error body. Every error response carries a stable
/// `code` and the trace id of the request that produced it.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: &'static str },
    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::Unauthorized { reason } => match *reason {
                "missing_bearer" => ErrorCode::UnauthorizedMissingBearer,
                _ => ErrorCode::Unauthorized,
            },
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotFound { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            AppError::Validation { detail, .. } => detail.clone(),
            AppError::Unauthorized { reason } => format!("Authentication required ({reason})"),
            AppError::Forbidden { detail } => detail.clone(),
            AppError::NotFound { detail, .. } => detail.clone(),
            AppError::Conflict { detail, .. } => detail.clone(),
            AppError::Internal { detail } => detail.clone(),
            AppError::Config { detail } => detail.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn unauthorized(reason: &'static str) -> Self {
        Self::Unauthorized { reason }
    }

    pub fn unauthorized_missing_bearer() -> Self {
        Self::Unauthorized {
            reason: "missing_bearer",
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    fn title(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::CONFLICT => "Conflict",
            _ => "Internal Server Error",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(detail) => AppError::Validation {
                code: ErrorCode::ValidationError,
                detail,
            },
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::Request => ErrorCode::RequestNotFound,
                    NotFoundKind::Session => ErrorCode::SessionNotFound,
                    _ => ErrorCode::NotFound,
                };
                AppError::NotFound { code, detail }
            }
            DomainError::NotEligible(detail) => AppError::Conflict {
                code: ErrorCode::NotEligible,
                detail,
            },
            DomainError::AlreadyResolved(detail) => AppError::Conflict {
                code: ErrorCode::AlreadyResolved,
                detail,
            },
            DomainError::NotYourTurn(detail) => AppError::Conflict {
                code: ErrorCode::NotYourTurn,
                detail,
            },
            DomainError::InvalidState(detail) => AppError::Conflict {
                code: ErrorCode::InvalidState,
                detail,
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let trace_id = trace_ctx::trace_id();
        let body = ProblemDetails {
            type_: "about:blank".to_string(),
            title: self.title().to_string(),
            status: self.status().as_u16(),
            detail: self.detail(),
            code: self.code().to_string(),
            trace_id: trace_id.clone(),
        };
        HttpResponse::build(self.status())
            .insert_header(("x-trace-id", trace_id))
            .json(body)
    }
}
