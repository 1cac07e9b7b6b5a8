//! Domain layer: pure match-coordination types and transitions.
//!
//! Nothing in here touches the network, the presence registry, or the
//! clock tasks. Session mutation rules live on [`session::MatchSession`] so
//! the service layer can stay a thin concurrency shell around them.

pub mod identity;
pub mod pairing;
pub mod session;
pub mod snapshot;

#[cfg(test)]
mod tests_pairing;
#[cfg(test)]
mod tests_props_session;
#[cfg(test)]
mod tests_session;

// Re-exports for ergonomics
pub use identity::{Identity, Role};
pub use pairing::{PairingMode, PairingRequest, RequestStatus};
pub use session::{
    ClockTick, Color, EndReason, MatchResult, MatchSession, SessionStatus, Side, SideId,
    TerminalKind, TimeControl,
};
pub use snapshot::{SessionSnapshot, SideView};
