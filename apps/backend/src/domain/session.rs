//! The central session entity and its transition rules.
//!
//! Invariants enforced here:
//! - exactly one clock decreases per tick, selected by `turn`;
//! - `turn` flips exactly once per accepted move and on no other event;
//! - `Active -> Finished` happens at most once and never reverses;
//! - `result` and `reason` are set together at that single transition;
//! - `move_log` is append-only and its parity matches `turn` relative to
//!   the side holding the first-moving color.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::domain::pairing::PairingMode;
use crate::errors::domain::DomainError;

/// Opaque starting-position token handed to new sessions. Clients replace
/// it with their own serialized position on every move; the core never
/// parses it.
pub const START_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Stable seat identifier within one session. Side A is always the
/// pairing initiator; colors are assigned separately by coin flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideId {
    A,
    B,
}

impl SideId {
    pub fn other(self) -> SideId {
        match self {
            SideId::A => SideId::B,
            SideId::B => SideId::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SideId::A => 0,
            SideId::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    SideA,
    SideB,
    Draw,
}

impl MatchResult {
    pub fn win_for(side: SideId) -> MatchResult {
        match side {
            SideId::A => MatchResult::SideA,
            SideId::B => MatchResult::SideB,
        }
    }
}

/// Why a session ended. `Resignation`, `Agreement` and `Timeout` originate
/// inside this core; the rest are client-reported terminal positions the
/// core accepts without verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Resignation,
    Agreement,
    Timeout,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

/// Client-reported terminal condition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl TerminalKind {
    /// Outcome of reporting this condition while `to_move` holds the turn.
    /// The side to move is the one with no legal continuation, so checkmate
    /// scores for its opponent; every other kind is a draw.
    pub fn outcome(self, to_move: SideId) -> (MatchResult, EndReason) {
        match self {
            TerminalKind::Checkmate => {
                (MatchResult::win_for(to_move.other()), EndReason::Checkmate)
            }
            TerminalKind::Stalemate => (MatchResult::Draw, EndReason::Stalemate),
            TerminalKind::InsufficientMaterial => {
                (MatchResult::Draw, EndReason::InsufficientMaterial)
            }
            TerminalKind::ThreefoldRepetition => {
                (MatchResult::Draw, EndReason::ThreefoldRepetition)
            }
            TerminalKind::FiftyMoveRule => (MatchResult::Draw, EndReason::FiftyMoveRule),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub initial_secs: u32,
}

impl Default for TimeControl {
    fn default() -> Self {
        Self { initial_secs: 600 }
    }
}

/// One seat of a session: who sits there and which color they were dealt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub identity: Identity,
    pub color: Color,
}

/// Result of advancing the clock by one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Running,
    /// The given side's clock reached zero on this tick.
    Flagged(SideId),
}

#[derive(Debug, Clone)]
pub struct MatchSession {
    pub id: Uuid,
    pub sides: [Side; 2],
    pub mode: PairingMode,
    pub position_token: String,
    pub move_log: Vec<String>,
    pub turn: SideId,
    pub clocks: [u32; 2],
    pub status: SessionStatus,
    pub result: Option<MatchResult>,
    pub reason: Option<EndReason>,
    pub draw_offer: Option<SideId>,
    pub presence: [bool; 2],
    pub started_at: OffsetDateTime,
    pub last_move_at: Option<OffsetDateTime>,
}

impl MatchSession {
    /// Create an active session. `white` names the side dealt the
    /// first-moving color, so `turn` starts there.
    pub fn new(
        id: Uuid,
        side_a: Identity,
        side_b: Identity,
        white: SideId,
        mode: PairingMode,
        time_control: TimeControl,
        now: OffsetDateTime,
    ) -> Self {
        let color_of = |side: SideId| {
            if side == white {
                Color::White
            } else {
                Color::Black
            }
        };
        Self {
            id,
            sides: [
                Side {
                    identity: side_a,
                    color: color_of(SideId::A),
                },
                Side {
                    identity: side_b,
                    color: color_of(SideId::B),
                },
            ],
            mode,
            position_token: START_POSITION.to_string(),
            move_log: Vec::new(),
            turn: white,
            clocks: [time_control.initial_secs, time_control.initial_secs],
            status: SessionStatus::Active,
            result: None,
            reason: None,
            draw_offer: None,
            presence: [false, false],
            started_at: now,
            last_move_at: None,
        }
    }

    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.index()]
    }

    /// Which seat an identity occupies, if any.
    pub fn side_of(&self, sub: &str) -> Option<SideId> {
        if self.sides[0].identity.sub == sub {
            Some(SideId::A)
        } else if self.sides[1].identity.sub == sub {
            Some(SideId::B)
        } else {
            None
        }
    }

    pub fn white_side(&self) -> SideId {
        if self.sides[0].color == Color::White {
            SideId::A
        } else {
            SideId::B
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn clock(&self, side: SideId) -> u32 {
        self.clocks[side.index()]
    }

    fn require_active(&self) -> Result<(), DomainError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::invalid_state("session is not active"))
        }
    }

    /// Apply a move for `side`: append the token, replace the position,
    /// flip the turn, stamp the move time. Clocks are untouched; only
    /// ticks change clocks.
    pub fn apply_move(
        &mut self,
        side: SideId,
        move_token: String,
        position_token: String,
        now: OffsetDateTime,
    ) -> Result<(), DomainError> {
        self.require_active()?;
        if side != self.turn {
            return Err(DomainError::not_your_turn("it is not this side's turn"));
        }
        self.move_log.push(move_token);
        self.position_token = position_token;
        self.turn = self.turn.other();
        self.last_move_at = Some(now);
        debug_assert!(self.turn_matches_parity());
        Ok(())
    }

    /// Advance the clock of the side holding the turn by one unit, floored
    /// at zero. Callers must only tick active sessions.
    pub fn tick(&mut self) -> ClockTick {
        debug_assert!(self.is_active());
        let idx = self.turn.index();
        self.clocks[idx] = self.clocks[idx].saturating_sub(1);
        if self.clocks[idx] == 0 {
            ClockTick::Flagged(self.turn)
        } else {
            ClockTick::Running
        }
    }

    /// Terminal transition. Returns `true` when this call performed the
    /// transition; a second call is a no-op and the first result stands.
    pub fn finish(&mut self, result: MatchResult, reason: EndReason) -> bool {
        if self.status == SessionStatus::Finished {
            return false;
        }
        self.status = SessionStatus::Finished;
        self.result = Some(result);
        self.reason = Some(reason);
        self.draw_offer = None;
        true
    }

    pub fn offer_draw(&mut self, side: SideId) -> Result<(), DomainError> {
        self.require_active()?;
        self.draw_offer = Some(side);
        Ok(())
    }

    /// Accepting requires a standing offer from the opponent; accepting
    /// one's own offer is meaningless and rejected. The terminal
    /// transition itself goes through [`MatchSession::finish`].
    pub fn may_accept_draw(&self, side: SideId) -> Result<(), DomainError> {
        self.require_active()?;
        if self.draw_offer != Some(side.other()) {
            return Err(DomainError::invalid_state(
                "no draw offer from the opponent is standing",
            ));
        }
        Ok(())
    }

    /// Move-log parity must agree with `turn`: with an even number of
    /// moves the first-moving side is to move again.
    pub fn turn_matches_parity(&self) -> bool {
        let expected = if self.move_log.len() % 2 == 0 {
            self.white_side()
        } else {
            self.white_side().other()
        };
        self.turn == expected
    }
}
