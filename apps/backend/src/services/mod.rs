//! Coordination services: shared registries and the match flow shell.
//!
//! Presence, session and pairing tables are the only state touched from
//! multiple connection handlers concurrently; each is independently
//! lockable and none is guarded by a global lock.

pub mod match_flow;
pub mod pairing;
pub mod presence;
pub mod session_registry;
