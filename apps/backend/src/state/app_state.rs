use std::sync::Arc;

use super::security_config::SecurityConfig;
use crate::config::MatchConfig;
use crate::services::pairing::PairingExchange;
use crate::services::presence::PresenceDirectory;
use crate::services::session_registry::SessionRegistry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub presence: Arc<PresenceDirectory>,
    pub sessions: Arc<SessionRegistry>,
    pub pairing: Arc<PairingExchange>,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
    pub match_config: MatchConfig,
}

impl AppState {
    pub fn new(security: SecurityConfig, match_config: MatchConfig) -> Self {
        let presence = Arc::new(PresenceDirectory::new());
        let sessions = Arc::new(SessionRegistry::new());
        let pairing = Arc::new(PairingExchange::new(presence.clone(), sessions.clone()));
        Self {
            presence,
            sessions,
            pairing,
            security,
            match_config,
        }
    }

    /// State with default security and match tunables. Used by unit and
    /// integration tests.
    pub fn for_tests() -> Self {
        Self::new(SecurityConfig::default(), MatchConfig::default())
    }

    /// Test state with a shrunken match configuration.
    pub fn for_tests_with_config(match_config: MatchConfig) -> Self {
        Self::new(SecurityConfig::default(), match_config)
    }
}
