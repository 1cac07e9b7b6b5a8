//! JSON websocket protocol for match coordination.
//!
//! Every frame is a tagged object; `type` selects the variant. Client
//! frames other than `hello` are rejected until the hello handshake is
//! done. Server frames are either direct replies on the originating
//! connection or fan-outs routed through the presence directory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::domain::pairing::{PairingMode, RequestStatus};
use crate::domain::session::{EndReason, MatchResult, SideId, TerminalKind, TimeControl};
use crate::domain::snapshot::SessionSnapshot;
use crate::error::AppError;
use crate::errors::ErrorCode;

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello {
        protocol: i32,
    },

    RequestSubmit {
        mode: PairingMode,
        target: Option<String>,
    },
    RequestCancel {
        request_id: Uuid,
    },
    RequestAccept {
        request_id: Uuid,
        time_control: Option<TimeControl>,
    },
    RequestDecline {
        request_id: Uuid,
    },

    MoveSubmit {
        session_id: Uuid,
        from: String,
        to: String,
        promotion: Option<String>,
        new_position_token: String,
    },
    Resign {
        session_id: Uuid,
    },
    OfferDraw {
        session_id: Uuid,
    },
    AcceptDraw {
        session_id: Uuid,
    },
    ReportTerminal {
        session_id: Uuid,
        kind: TerminalKind,
    },
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        sub: String,
    },

    Ack {
        message: &'static str,
    },

    RequestSent {
        request_id: Uuid,
        status: RequestStatus,
    },
    /// Incoming invitation, delivered to eligible responders.
    RequestOffer {
        request_id: Uuid,
        from: Identity,
        mode: PairingMode,
    },
    RequestResolved {
        request_id: Uuid,
        status: RequestStatus,
    },

    SessionStarted {
        session: SessionSnapshot,
    },
    /// Full-state replay pushed to a (re)connecting participant only.
    SessionResume {
        session: SessionSnapshot,
    },
    MoveApplied {
        session_id: Uuid,
        move_token: String,
        position_token: String,
        clock_a: u32,
        clock_b: u32,
        turn: SideId,
    },
    DrawOffered {
        session_id: Uuid,
        by: SideId,
    },
    ClockUpdate {
        session_id: Uuid,
        clock_a: u32,
        clock_b: u32,
        turn: SideId,
    },
    PeerStatus {
        session_id: Uuid,
        side: SideId,
        online: bool,
    },
    SessionEnded {
        session_id: Uuid,
        result: MatchResult,
        reason: EndReason,
    },

    Error {
        code: WsErrorCode,
        message: String,
    },
}

impl ServerMsg {
    pub fn error_of(err: &AppError) -> ServerMsg {
        ServerMsg::Error {
            code: WsErrorCode::of(err),
            message: err.detail(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsErrorCode {
    BadProtocol,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    NotEligible,
    AlreadyResolved,
    NotYourTurn,
    InvalidState,
    Internal,
}

impl WsErrorCode {
    pub fn of(err: &AppError) -> WsErrorCode {
        match err {
            AppError::Unauthorized { .. } => WsErrorCode::Unauthorized,
            AppError::Forbidden { .. } => WsErrorCode::Forbidden,
            AppError::NotFound { .. } => WsErrorCode::NotFound,
            AppError::Validation { .. } => WsErrorCode::BadRequest,
            AppError::Conflict { code, .. } => match code {
                ErrorCode::NotEligible => WsErrorCode::NotEligible,
                ErrorCode::AlreadyResolved => WsErrorCode::AlreadyResolved,
                ErrorCode::NotYourTurn => WsErrorCode::NotYourTurn,
                ErrorCode::InvalidState => WsErrorCode::InvalidState,
                _ => WsErrorCode::BadRequest,
            },
            AppError::Internal { .. } | AppError::Config { .. } => WsErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientMsg, ServerMsg, WsErrorCode};
    use crate::errors::domain::DomainError;
    use crate::AppError;

    #[test]
    fn client_frames_decode_from_tagged_json() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"move_submit","session_id":"6b9f6743-5a3b-4f3e-9e53-2b18b38e3a3b",
                "from":"e2","to":"e4","promotion":null,
                "new_position_token":"tok"}"#,
        )
        .unwrap();
        match msg {
            ClientMsg::MoveSubmit { from, to, .. } => {
                assert_eq!(from, "e2");
                assert_eq!(to, "e4");
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn server_frames_carry_snake_case_tags() {
        let encoded = serde_json::to_string(&ServerMsg::Ack { message: "ok" }).unwrap();
        assert!(encoded.contains(r#""type":"ack""#));
    }

    #[test]
    fn conflict_codes_map_to_ws_codes() {
        let err: AppError = DomainError::not_your_turn("wait").into();
        assert_eq!(WsErrorCode::of(&err), WsErrorCode::NotYourTurn);
        let err: AppError = DomainError::already_resolved("lost").into();
        assert_eq!(WsErrorCode::of(&err), WsErrorCode::AlreadyResolved);
    }
}
